//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of `/proc` files into
//! structured data. They are designed to be easily testable with string inputs.

use crate::error::ParseError;

/// Fields a scan needs from `/proc/[pid]/stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStat {
    /// Field 0.
    pub pid: u32,
    /// Field 3.
    pub ppid: u32,
    /// Field 4, reported in the `sid` column.
    pub sid: u32,
    /// Field 38 (`processor`), absent on truncated lines.
    pub processor: Option<u32>,
}

const STAT_PID: usize = 0;
const STAT_PPID: usize = 3;
const STAT_SID: usize = 4;
const STAT_PROCESSOR: usize = 38;

/// Where the tokenizer is relative to the parenthesized name field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameState {
    BeforeName,
    /// Inside the name, which may hold unmatched `(` or `)`.
    InName,
    AfterName,
}

/// Splits a stat line into its space-separated fields.
///
/// Spaces inside the parenthesized name do not split. The name closes at the
/// last `)` on the line. Parentheses inside the name need not balance; the
/// numeric fields after it never contain any.
pub fn split_stat_fields(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches('\n');
    let last_close = line.rfind(')');

    let mut fields = Vec::new();
    let mut state = NameState::BeforeName;
    let mut start = 0;

    for (i, c) in line.char_indices() {
        state = match (state, c) {
            (NameState::BeforeName, '(') => NameState::InName,
            (NameState::InName, ')') if Some(i) == last_close => NameState::AfterName,
            (NameState::BeforeName | NameState::AfterName, ' ') => {
                fields.push(&line[start..i]);
                start = i + 1;
                state
            }
            _ => state,
        };
    }
    if start < line.len() {
        fields.push(&line[start..]);
    }
    fields
}

/// Parses `/proc/[pid]/stat` content.
///
/// Format: pid (comm) state ppid pgrp session tty_nr ...
/// Fields 0 through 4 are mandatory; anything shorter is malformed.
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let fields = split_stat_fields(content);

    let parse_field = |idx: usize, name: &str| -> Result<u32, ParseError> {
        fields
            .get(idx)
            .ok_or_else(|| {
                ParseError::new(format!(
                    "missing field {} ({}): got {} fields",
                    idx,
                    name,
                    fields.len()
                ))
            })?
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}: {:?}", name, fields[idx])))
    };

    let pid = parse_field(STAT_PID, "pid")?;
    let ppid = parse_field(STAT_PPID, "ppid")?;
    let sid = parse_field(STAT_SID, "sid")?;
    let processor = if fields.len() > STAT_PROCESSOR {
        Some(parse_field(STAT_PROCESSOR, "processor")?)
    } else {
        None
    };

    Ok(ProcStat {
        pid,
        ppid,
        sid,
        processor,
    })
}

/// Fields a scan needs from `/proc/[pid]/status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStatus {
    pub name: String,
    pub pid: u32,
    pub ppid: u32,
    pub tgid: u32,
}

/// Parses `/proc/[pid]/status` content.
///
/// Format is `Key:\tvalue` pairs, one per line. Only `Name`, `Pid`, `PPid`
/// and `Tgid` are read; all four must be present.
pub fn parse_proc_status(content: &str) -> Result<ProcStatus, ParseError> {
    let mut name = None;
    let mut pid = None;
    let mut ppid = None;
    let mut tgid = None;

    let parse_id = |key: &str, value: &str| -> Result<u32, ParseError> {
        value
            .trim()
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}: {:?}", key, value.trim())))
    };

    for line in content.lines() {
        if let Some(value) = line.strip_prefix("Name:") {
            name = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Pid:") {
            pid = Some(parse_id("Pid", value)?);
        } else if let Some(value) = line.strip_prefix("PPid:") {
            ppid = Some(parse_id("PPid", value)?);
        } else if let Some(value) = line.strip_prefix("Tgid:") {
            tgid = Some(parse_id("Tgid", value)?);
        }
    }

    let missing = |key: &str| ParseError::new(format!("missing {} line", key));
    Ok(ProcStatus {
        name: name.ok_or_else(|| missing("Name"))?,
        pid: pid.ok_or_else(|| missing("Pid"))?,
        ppid: ppid.ok_or_else(|| missing("PPid"))?,
        tgid: tgid.ok_or_else(|| missing("Tgid"))?,
    })
}

/// Parses `/proc/sys/kernel/pid_max`: the first whitespace-separated token
/// must be an integer.
pub fn parse_pid_max(content: &str) -> Result<u32, ParseError> {
    let token = content
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::new("empty pid_max"))?;
    token
        .parse()
        .map_err(|_| ParseError::new(format!("invalid pid_max: {:?}", token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAIL: &str = "0 -1 4194560 1000 0 0 0 10 5 0 0 20 0 1 0 500100 10000000 1000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0 0 0 0 0 0 0 0 0";

    #[test]
    fn test_parse_proc_stat_basic() {
        let content = "1234 (bash) S 1233 1234 1234 34816 1235 4194304 5000 50000 10 20 100 50 200 100 20 0 1 0 100000 25000000 2000 18446744073709551615 0 0 0 0 0 0 65536 3670020 1266777851 0 0 0 17 2 0 0 5 0 0 0 0 0 0 0 0 0 0\n";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.pid, 1234);
        assert_eq!(stat.ppid, 1233);
        assert_eq!(stat.sid, 1234);
        assert_eq!(stat.processor, Some(2));
    }

    #[test]
    fn test_parse_proc_stat_with_spaces_in_comm() {
        let content = "5000 (Web Content) S 4999 5000 4999 0 -1 4194304 100000 0 500 0 5000 1000 0 0 20 0 20 0 500000 2000000000 50000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0 0 0 0 0 0 0 0 0";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.pid, 5000);
        assert_eq!(stat.ppid, 4999);
        assert_eq!(stat.sid, 5000);
        assert_eq!(stat.processor, Some(1));
    }

    #[test]
    fn test_parse_proc_stat_with_nested_parentheses_and_spaces() {
        let content = format!("123 (my (odd) name) S 1 77 88 {}", TAIL);
        let fields = split_stat_fields(&content);
        assert_eq!(fields[0], "123");
        assert_eq!(fields[1], "(my (odd) name)");
        assert_eq!(fields[2], "S");
        assert_eq!(fields[3], "1");
        assert_eq!(fields[4], "77");

        let stat = parse_proc_stat(&content).unwrap();
        assert_eq!(stat.pid, 123);
        assert_eq!(stat.ppid, 1);
        assert_eq!(stat.sid, 77);
        assert_eq!(stat.processor, Some(3));
    }

    #[test]
    fn test_parse_proc_stat_with_unbalanced_close_paren_in_comm() {
        let content = format!("321 (a) b) S 9 10 11 {}", TAIL);
        let fields = split_stat_fields(&content);
        assert_eq!(fields[1], "(a) b)");

        let stat = parse_proc_stat(&content).unwrap();
        assert_eq!(stat.pid, 321);
        assert_eq!(stat.ppid, 9);
        assert_eq!(stat.sid, 10);
    }

    #[test]
    fn test_parse_proc_stat_with_unmatched_open_paren_in_comm() {
        for comm in ["((x", "(", "x("] {
            let content = format!("5 ({}) S 1 6 7 {}", comm, TAIL);
            let fields = split_stat_fields(&content);
            assert_eq!(fields[1], format!("({})", comm));
            assert_eq!(fields[2], "S");

            let stat = parse_proc_stat(&content).unwrap();
            assert_eq!(stat.pid, 5, "{}", comm);
            assert_eq!(stat.ppid, 1, "{}", comm);
            assert_eq!(stat.sid, 6, "{}", comm);
            assert_eq!(stat.processor, Some(3), "{}", comm);
        }
    }

    #[test]
    fn test_parse_proc_stat_with_close_paren_space_in_comm() {
        // A name that looks like the end of the name field followed by a state.
        let content = format!("400 (x) S 5 (y) S 6 7 8 {}", TAIL);
        let stat = parse_proc_stat(&content).unwrap();
        assert_eq!(stat.pid, 400);
        assert_eq!(stat.ppid, 6);
        assert_eq!(stat.sid, 7);
    }

    #[test]
    fn test_parse_proc_stat_truncated_line_has_no_processor() {
        let stat = parse_proc_stat("123 (my (odd) name) S 1 1 1 0 -1").unwrap();
        assert_eq!(stat.pid, 123);
        assert_eq!(stat.ppid, 1);
        assert_eq!(stat.sid, 1);
        assert_eq!(stat.processor, None);
    }

    #[test]
    fn test_parse_proc_stat_too_few_fields() {
        let err = parse_proc_stat("77 (init) S 1").unwrap_err();
        assert!(err.message.contains("missing field 4"), "{}", err.message);

        assert!(parse_proc_stat("").is_err());
    }

    #[test]
    fn test_parse_proc_stat_non_numeric_pid() {
        let err = parse_proc_stat("abc (x) S 1 1 1").unwrap_err();
        assert!(err.message.contains("invalid pid"));
    }

    #[test]
    fn test_parse_proc_status() {
        let content = "\
Name:\tirq/45-can0
Umask:\t0000
State:\tS (sleeping)
Tgid:\t812
Ngid:\t0
Pid:\t815
PPid:\t2
TracerPid:\t0
Uid:\t0\t0\t0\t0
NSpid:\t815
NStgid:\t812
Cpus_allowed_list:\t0-1
";
        let status = parse_proc_status(content).unwrap();

        assert_eq!(status.name, "irq/45-can0");
        assert_eq!(status.pid, 815);
        assert_eq!(status.ppid, 2);
        assert_eq!(status.tgid, 812);
    }

    #[test]
    fn test_parse_proc_status_trims_name_both_ends() {
        let content = "Name:\t  padded name \t\nTgid:\t1\nPid:\t1\nPPid:\t0\n";
        let status = parse_proc_status(content).unwrap();
        assert_eq!(status.name, "padded name");
    }

    #[test]
    fn test_parse_proc_status_missing_key() {
        let err = parse_proc_status("Name:\tx\nPid:\t5\nTgid:\t5\n").unwrap_err();
        assert_eq!(err.message, "missing PPid line");
    }

    #[test]
    fn test_parse_proc_status_invalid_number() {
        let err = parse_proc_status("Name:\tx\nPid:\tfive\nPPid:\t1\nTgid:\t5\n").unwrap_err();
        assert!(err.message.starts_with("invalid Pid"));
    }

    #[test]
    fn test_parse_pid_max() {
        assert_eq!(parse_pid_max("4194304\n").unwrap(), 4194304);
        assert_eq!(parse_pid_max("  32768 trailing").unwrap(), 32768);
        assert!(parse_pid_max("").is_err());
        assert!(parse_pid_max("lots\n").is_err());
    }
}
