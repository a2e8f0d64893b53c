//! Process supervisor: spawns the Claude Code CLI, captures stdout/stderr
//! as [`ExecutorOutputChunk`]s, and enforces the three-timer supervision
//! regime from spec.md §4.2 (idle, overall, silence-log).
//!
//! Spawns with stdin closed, `libc::setpgid` in a `pre_exec` hook so the
//! whole process group can be killed on timeout rather than leaking
//! orphaned children, and a `tokio::select!` loop carrying idle/overall/
//! silence timers side by side rather than a single overall-timeout race,
//! with line-at-a-time chunk emission through [`pmr_stream::OutputStream`]
//! instead of a post-hoc buffer dump.

use crate::error::ExecutorError;
use crate::timeout_profile::TimeoutProfile;
use once_cell::sync::Lazy;
use pmr_types::{ChunkStream, ExecutorOutputChunk, SessionId, TaskId};
use regex::Regex;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

/// Lines matching any of these are an interactive prompt the runner will
/// never answer; a matching line terminates the child immediately rather
/// than let it block forever on stdin (spec.md §4.2, REPL_FAIL_CLOSED).
static INTERACTIVE_PROMPT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)do you want to proceed\??\s*$",
        r"(?i)\(y(es)?/n(o)?\)\s*$",
        r"(?i)press enter to continue",
        r"(?i)waiting for input",
        r"(?i)\[y/n\]\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid interactive-prompt regex"))
    .collect()
});

fn detect_interactive_prompt(line: &str) -> Option<String> {
    INTERACTIVE_PROMPT_PATTERNS
        .iter()
        .find(|re| re.is_match(line))
        .map(|_| line.trim().to_string())
}

pub struct SpawnOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub interactive_block: Option<String>,
    pub duration: Duration,
}

/// Runs `command` (the prompt having already been baked into its argument
/// list by the `ExecutorCommand` implementation), streaming output chunks
/// to `stream` as they arrive and enforcing `profile`'s timers.
///
/// Stdin is closed at spawn (spec.md §6): the prompt travels as a
/// `--prompt` argument, never over stdin, so there is nothing for an
/// interactive confirmation to read and the child fails closed immediately
/// rather than hanging on input that will never arrive.
pub async fn run_supervised(
    mut command: Command,
    profile: TimeoutProfile,
    stream: Arc<pmr_stream::OutputStream>,
    task_id: TaskId,
    session_id: SessionId,
) -> Result<SpawnOutcome, ExecutorError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        unsafe {
            command.pre_exec(|| {
                libc::setpgid(0, 0);
                Ok(())
            });
        }
    }

    let started = Instant::now();
    let mut child = command
        .spawn()
        .map_err(|e| ExecutorError::SpawnFailed { reason: e.to_string() })?;

    let stdout = child.stdout.take().expect("piped stdout");
    let stderr = child.stderr.take().expect("piped stderr");
    let mut stdout_lines = BufReader::new(stdout).lines();
    let mut stderr_lines = BufReader::new(stderr).lines();

    let mut stdout_buf = String::new();
    let mut stderr_buf = String::new();
    let mut interactive_block: Option<String> = None;

    let overall_deadline = if profile.disable_overall_timeout {
        None
    } else {
        Some(tokio::time::sleep(Duration::from_millis(profile.overall_timeout_ms)))
    };
    tokio::pin!(overall_deadline);
    // Warning-only: fires at most once, never terminates the child. Silence
    // alone must never terminate (spec.md §4.2) — the overall timeout,
    // interactive-prompt detection, and explicit cancellation are the only
    // terminators.
    let soft_timer = tokio::time::sleep(Duration::from_millis(profile.soft_timeout_ms));
    tokio::pin!(soft_timer);
    let mut soft_fired = false;
    let mut silence_timer = tokio::time::interval(Duration::from_millis(profile.silence_log_interval_ms));

    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut timed_out = false;

    loop {
        if (stdout_done && stderr_done) || interactive_block.is_some() {
            break;
        }

        tokio::select! {
            line = stdout_lines.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(text)) => {
                        if let Some(matched) = detect_interactive_prompt(&text) {
                            interactive_block = Some(matched);
                        }
                        stdout_buf.push_str(&text);
                        stdout_buf.push('\n');
                        publish_chunk(&stream, task_id, session_id, ChunkStream::Stdout, &text);
                    }
                    Ok(None) => stdout_done = true,
                    Err(_) => stdout_done = true,
                }
            }
            line = stderr_lines.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(text)) => {
                        stderr_buf.push_str(&text);
                        stderr_buf.push('\n');
                        publish_chunk(&stream, task_id, session_id, ChunkStream::Stderr, &text);
                    }
                    Ok(None) => stderr_done = true,
                    Err(_) => stderr_done = true,
                }
            }
            _ = &mut soft_timer, if !soft_fired => {
                soft_fired = true;
                tracing::warn!(
                    task_id = %task_id,
                    session_id = %session_id,
                    "executor soft timeout elapsed; still running, not terminating",
                );
                publish_chunk(&stream, task_id, session_id, ChunkStream::System, "soft timeout elapsed");
            }
            _ = async { overall_deadline.as_mut().as_pin_mut().unwrap().await }, if overall_deadline.is_some() => {
                timed_out = true;
                break;
            }
            _ = silence_timer.tick() => {
                tracing::info!(
                    task_id = %task_id,
                    session_id = %session_id,
                    "executor still running, no new output",
                );
                publish_chunk(&stream, task_id, session_id, ChunkStream::System, "still running");
            }
        }
    }

    if timed_out || interactive_block.is_some() {
        terminate(&mut child).await;
    }

    let exit_code = if timed_out || interactive_block.is_some() {
        None
    } else {
        child.wait().await.ok().and_then(|status| status.code())
    };

    Ok(SpawnOutcome {
        stdout: stdout_buf,
        stderr: stderr_buf,
        exit_code,
        timed_out,
        interactive_block,
        duration: started.elapsed(),
    })
}

fn publish_chunk(
    stream: &pmr_stream::OutputStream,
    task_id: TaskId,
    session_id: SessionId,
    kind: ChunkStream,
    text: &str,
) {
    stream.publish(ExecutorOutputChunk {
        timestamp: chrono::Utc::now(),
        task_id,
        session_id,
        stream: kind,
        text: text.to_string(),
        sequence: stream.next_sequence(),
        project_id: None,
    });
}

#[cfg(unix)]
async fn terminate(child: &mut Child) {
    if let Some(pid) = child.id() {
        unsafe {
            libc::killpg(pid as i32, libc::SIGTERM);
        }
        let grace = tokio::time::sleep(Duration::from_millis(2_000));
        tokio::pin!(grace);
        tokio::select! {
            _ = child.wait() => {}
            _ = &mut grace => {
                unsafe {
                    libc::killpg(pid as i32, libc::SIGKILL);
                }
                let _ = child.wait().await;
            }
        }
    } else {
        let _ = child.kill().await;
    }
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child) {
    let _ = child.kill().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_interactive_prompts() {
        assert!(detect_interactive_prompt("Do you want to proceed?").is_some());
        assert!(detect_interactive_prompt("Continue? (y/n)").is_some());
        assert!(detect_interactive_prompt("normal log line").is_none());
    }

    #[tokio::test]
    async fn completes_quickly_on_a_trivial_command() {
        let mut command = Command::new("printf");
        command.arg("done");
        let stream = Arc::new(pmr_stream::OutputStream::new(64));
        let outcome = run_supervised(
            command,
            TimeoutProfile::default(),
            stream,
            TaskId::new(),
            SessionId::new(),
        )
        .await
        .unwrap();
        assert!(!outcome.timed_out);
        assert!(outcome.interactive_block.is_none());
    }

    #[tokio::test]
    async fn overall_timeout_terminates_a_hanging_process() {
        let mut command = Command::new("sleep");
        command.arg("5");
        let stream = Arc::new(pmr_stream::OutputStream::new(64));
        let profile = TimeoutProfile {
            soft_timeout_ms: 1_000_000,
            overall_timeout_ms: 50,
            silence_log_interval_ms: 1_000_000,
            disable_overall_timeout: false,
        };
        let outcome = run_supervised(
            command,
            profile,
            stream,
            TaskId::new(),
            SessionId::new(),
        )
        .await
        .unwrap();
        assert!(outcome.timed_out);
        assert!(outcome.exit_code.is_none());
    }

    #[tokio::test]
    async fn silence_alone_never_terminates_the_child() {
        // A process that stays quiet for longer than the silence-log
        // interval and the soft timeout, but finishes before the overall
        // timeout, must complete normally rather than being terminated.
        let mut command = Command::new("sh");
        command.arg("-c").arg("sleep 0.2; echo done");
        let stream = Arc::new(pmr_stream::OutputStream::new(64));
        let profile = TimeoutProfile {
            soft_timeout_ms: 10,
            overall_timeout_ms: 60_000,
            silence_log_interval_ms: 10,
            disable_overall_timeout: false,
        };
        let outcome = run_supervised(
            command,
            profile,
            stream,
            TaskId::new(),
            SessionId::new(),
        )
        .await
        .unwrap();
        assert!(!outcome.timed_out);
        assert!(outcome.interactive_block.is_none());
        assert!(outcome.stdout.contains("done"));
    }
}
