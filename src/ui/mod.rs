//! Line-oriented interactive loop.
//!
//! Carries no scanning logic of its own: every command maps onto the scan
//! session operations or a point peek/poke. Generic over the access
//! backend and the input/output streams so the whole loop can be driven
//! from a test script.

use std::fs::File;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::access::ProcessMemoryAccess;
use crate::config::Config;
use crate::core::types::{Address, ScanResult, ScanWidth};
use crate::scan::{ScanCondition, ScanMatch, ScanSession};

/// Runs the interactive prompt until `q` or end of input.
///
/// `open` turns a pid into an access backend; scan and edit failures are
/// reported on `out` and the loop continues. Only stream I/O errors
/// propagate.
pub fn run_loop<A, F, R, W>(
    mut open: F,
    input: &mut R,
    out: &mut W,
    config: &Config,
) -> io::Result<()>
where
    A: ProcessMemoryAccess,
    F: FnMut(u32) -> ScanResult<A>,
    R: BufRead,
    W: Write,
{
    let mut session = match new_scan(&mut open, input, out, config)? {
        Some(session) => session,
        None => return Ok(()),
    };

    loop {
        print_menu(out)?;
        let line = match prompt(input, out, "> ")? {
            Some(line) => line,
            None => break,
        };

        match line.as_str() {
            "" => {}
            "i" => {
                let _ = session.narrow(ScanCondition::Increased);
                writeln!(out, "{} matches found", session.total_matches())?;
            }
            "d" => {
                let _ = session.narrow(ScanCondition::Decreased);
                writeln!(out, "{} matches found", session.total_matches())?;
            }
            "m" => print_matches(&session, out)?,
            "p" => poke_prompt(&session, input, out)?,
            "n" => match new_scan(&mut open, input, out, config)? {
                Some(next) => session = next,
                None => break,
            },
            "x" => extended(&session, input, out)?,
            "q" => break,
            other => match parse_scalar(other) {
                Some(value) => {
                    let _ = session.narrow(ScanCondition::Equals(value));
                    writeln!(out, "{} matches found", session.total_matches())?;
                }
                None => writeln!(out, "unrecognised command: {other}")?,
            },
        }
    }

    Ok(())
}

/// Prompts for pid, element width and start value and runs the initial
/// pass. Loops on bad input; returns `None` at end of input.
fn new_scan<A, F, R, W>(
    open: &mut F,
    input: &mut R,
    out: &mut W,
    config: &Config,
) -> io::Result<Option<ScanSession<A>>>
where
    A: ProcessMemoryAccess,
    F: FnMut(u32) -> ScanResult<A>,
    R: BufRead,
    W: Write,
{
    loop {
        let pid_line = match prompt(input, out, "\nEnter the pid: ")? {
            Some(line) => line,
            None => return Ok(None),
        };
        let pid = match parse_scalar(&pid_line) {
            Some(pid) => pid,
            None => {
                writeln!(out, "invalid pid")?;
                continue;
            }
        };

        let width_line = match prompt(input, out, "Enter the data size: ")? {
            Some(line) => line,
            None => return Ok(None),
        };
        let width = ScanWidth::from_bytes(
            parse_scalar(&width_line)
                .map(|bytes| bytes as usize)
                .unwrap_or(config.scanner.default_width),
        );

        let value_line = match prompt(input, out, "Enter the start value, or 'u' for unknown: ")? {
            Some(line) => line,
            None => return Ok(None),
        };
        let condition = if value_line.eq_ignore_ascii_case("u") {
            ScanCondition::Unconditional
        } else if let Some(value) = parse_scalar(&value_line) {
            ScanCondition::Equals(value)
        } else {
            writeln!(out, "invalid start value")?;
            continue;
        };

        let access = match open(pid) {
            Ok(access) => access,
            Err(err) => {
                writeln!(out, "cannot open process {pid}: {err}")?;
                continue;
            }
        };

        match ScanSession::start_with(access, width, condition, &config.scanner) {
            Ok(session) => {
                writeln!(out, "{} matches found", session.total_matches())?;
                return Ok(Some(session));
            }
            Err(err) => writeln!(out, "scan failed: {err}")?,
        }
    }
}

fn print_matches<A, W>(session: &ScanSession<A>, out: &mut W) -> io::Result<()>
where
    A: ProcessMemoryAccess,
    W: Write,
{
    for result in session.matches() {
        match result {
            Ok(ScanMatch { address, value }) => {
                writeln!(out, "{address}: 0x{value:08X} ({value})")?;
            }
            Err(err) => writeln!(out, "{err}")?,
        }
    }
    Ok(())
}

fn poke_prompt<A, R, W>(session: &ScanSession<A>, input: &mut R, out: &mut W) -> io::Result<()>
where
    A: ProcessMemoryAccess,
    R: BufRead,
    W: Write,
{
    let addr_line = match prompt(input, out, "Enter the address: ")? {
        Some(line) => line,
        None => return Ok(()),
    };
    let address = match Address::from_str(&addr_line) {
        Ok(address) => address,
        Err(err) => {
            writeln!(out, "{err}")?;
            return Ok(());
        }
    };

    let value_line = match prompt(input, out, "Enter the value: ")? {
        Some(line) => line,
        None => return Ok(()),
    };
    let value = match parse_scalar(&value_line) {
        Some(value) => value,
        None => {
            writeln!(out, "invalid value")?;
            return Ok(());
        }
    };

    match session.poke(address, value) {
        Ok(()) => writeln!(out, "poked {address}")?,
        Err(err) => writeln!(out, "poke failed: {err}")?,
    }
    Ok(())
}

fn extended<A, R, W>(session: &ScanSession<A>, input: &mut R, out: &mut W) -> io::Result<()>
where
    A: ProcessMemoryAccess,
    R: BufRead,
    W: Write,
{
    let choice = match prompt(input, out, "[md] memory dump  [mj] save matches as JSON: ")? {
        Some(line) => line,
        None => return Ok(()),
    };
    match choice.as_str() {
        "md" => dump_blocks(session, out),
        "mj" => save_matches_json(session, input, out),
        other => writeln!(out, "unrecognised option: {other}"),
    }
}

/// Hex dump of every block's snapshot, as last read
fn dump_blocks<A, W>(session: &ScanSession<A>, out: &mut W) -> io::Result<()>
where
    A: ProcessMemoryAccess,
    W: Write,
{
    for block in session.blocks() {
        writeln!(out, "{} {} bytes", block.base_address(), block.size())?;
        for row in block.snapshot().chunks(32) {
            for byte in row {
                write!(out, "{byte:02x}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn save_matches_json<A, R, W>(
    session: &ScanSession<A>,
    input: &mut R,
    out: &mut W,
) -> io::Result<()>
where
    A: ProcessMemoryAccess,
    R: BufRead,
    W: Write,
{
    let path = match prompt(input, out, "Enter the output path: ")? {
        Some(line) if !line.is_empty() => line,
        _ => return Ok(()),
    };

    let mut matches: Vec<ScanMatch> = Vec::new();
    let mut faults = 0usize;
    for result in session.matches() {
        match result {
            Ok(found) => matches.push(found),
            Err(_) => faults += 1,
        }
    }

    let written = File::create(&path)
        .and_then(|file| serde_json::to_writer_pretty(file, &matches).map_err(io::Error::from));
    match written {
        Ok(()) => writeln!(out, "wrote {} matches to {path}", matches.len())?,
        Err(err) => writeln!(out, "save failed: {err}")?,
    }
    if faults > 0 {
        writeln!(out, "{faults} addresses could not be re-read")?;
    }
    Ok(())
}

fn print_menu<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Enter the next value or")?;
    writeln!(out, "[i] increased")?;
    writeln!(out, "[d] decreased")?;
    writeln!(out, "[m] print matches")?;
    writeln!(out, "[p] poke address")?;
    writeln!(out, "[n] new scan")?;
    writeln!(out, "[x] extended options")?;
    writeln!(out, "[q] quit")?;
    Ok(())
}

/// Writes `message`, reads one line and trims it; `None` at end of input
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    message: &str,
) -> io::Result<Option<String>> {
    write!(out, "{message}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Parses a decimal or `0x`-prefixed hex scalar (the original accepted
/// both everywhere)
fn parse_scalar(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse::<u32>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::mock::MockProcess;
    use std::io::Cursor;

    fn u32_region(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    fn run_script(process: &MockProcess, script: &str) -> String {
        let mut input = Cursor::new(script.to_string());
        let mut output = Vec::new();
        let opener = |_pid: u32| Ok(process.clone());
        run_loop(opener, &mut input, &mut output, &Config::default()).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_scalar("100"), Some(100));
        assert_eq!(parse_scalar("0x64"), Some(100));
        assert_eq!(parse_scalar("0X64"), Some(100));
        assert_eq!(parse_scalar(" 7 "), Some(7));
        assert_eq!(parse_scalar("u"), None);
        assert_eq!(parse_scalar(""), None);
    }

    #[test]
    fn test_exact_scan_and_print() {
        let process = MockProcess::new();
        process.add_region(0x1000, u32_region(&[1, 100, 3, 4]));

        let transcript = run_script(&process, "42\n4\n100\nm\nq\n");
        assert!(transcript.contains("1 matches found"));
        assert!(transcript.contains("0x00000064 (100)"));
    }

    #[test]
    fn test_unknown_scan_then_equals_narrow() {
        let process = MockProcess::new();
        process.add_region(0x1000, u32_region(&[10, 20, 30, 20]));

        // Unknown start, then a bare number narrows with exact-equals
        let transcript = run_script(&process, "42\n4\nu\n20\nq\n");
        assert!(transcript.contains("4 matches found"));
        assert!(transcript.contains("2 matches found"));
    }

    #[test]
    fn test_poke_command() {
        let process = MockProcess::new();
        process.add_region(0x1000, u32_region(&[55]));

        let transcript = run_script(&process, "42\n4\n55\np\n0x1000\n77\nm\nq\n");
        assert!(transcript.contains("poked"));
        assert!(transcript.contains("(77)"));
        assert_eq!(process.get_bytes(0x1000, 4), 77u32.to_ne_bytes().to_vec());
    }

    #[test]
    fn test_increase_decrease_commands() {
        let process = MockProcess::new();
        process.add_region(0x1000, u32_region(&[10, 10]));

        let mut input = Cursor::new("1\n4\nu\ni\nq\n".to_string());
        let mut output = Vec::new();
        let opener = |_pid: u32| Ok(process.clone());
        // Bump one value between reading the script's "u" and "i" is not
        // possible here, so the increase narrow simply empties the set
        run_loop(opener, &mut input, &mut output, &Config::default()).unwrap();
        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("0 matches found"));
    }

    #[test]
    fn test_memory_dump() {
        let process = MockProcess::new();
        process.add_region(0x1000, vec![0xAB, 0xCD]);

        let transcript = run_script(&process, "1\n1\nu\nx\nmd\nq\n");
        assert!(transcript.contains("2 bytes"));
        assert!(transcript.contains("abcd"));
    }

    #[test]
    fn test_json_dump() {
        let process = MockProcess::new();
        process.add_region(0x1000, u32_region(&[100]));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matches.json");
        let script = format!("1\n4\n100\nx\nmj\n{}\nq\n", path.display());
        let transcript = run_script(&process, &script);
        assert!(transcript.contains("wrote 1 matches"));

        let parsed: Vec<ScanMatch> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].value, 100);
    }

    #[test]
    fn test_eof_quits_cleanly() {
        let process = MockProcess::new();
        process.add_region(0x1000, u32_region(&[1]));

        // Input ends mid-prompt
        let transcript = run_script(&process, "1\n4\n");
        assert!(transcript.contains("Enter the start value"));
    }

    #[test]
    fn test_unrecognised_command() {
        let process = MockProcess::new();
        process.add_region(0x1000, u32_region(&[1]));

        let transcript = run_script(&process, "1\n4\n1\nzz\nq\n");
        assert!(transcript.contains("unrecognised command: zz"));
    }
}
