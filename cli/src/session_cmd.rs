use std::io::Write;

use anyhow::Context;
use clap::Parser;
use moodlift_core::ContentGenerator;
use moodlift_core::GenerationResult;
use moodlift_core::Mood;
use moodlift_resilience::CircuitState;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

use crate::GlobalArgs;
use crate::exit_codes;

#[derive(Debug, Parser)]
pub struct SessionArgs {}

#[derive(Debug, PartialEq, Eq)]
enum SessionCommand {
    Generate(Mood),
    Clear,
    Status,
    Quit,
    Unknown(String),
}

impl SessionCommand {
    fn parse(line: &str) -> Self {
        match line.to_ascii_lowercase().as_str() {
            "clear" => SessionCommand::Clear,
            "status" => SessionCommand::Status,
            "quit" | "exit" => SessionCommand::Quit,
            other => other
                .parse::<Mood>()
                .map(SessionCommand::Generate)
                .unwrap_or_else(|_| SessionCommand::Unknown(line.to_string())),
        }
    }
}

pub async fn run(global: &GlobalArgs, _args: SessionArgs) -> i32 {
    let config = match global.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return exit_codes::CONFIG_ERROR;
        }
    };

    let generator = ContentGenerator::from_config(&config);
    let input = BufReader::new(tokio::io::stdin());
    match run_session(&generator, input, &mut std::io::stdout()).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Session error: {e:#}");
            exit_codes::FAILURE
        }
    }
}

/// Process one command per input line until EOF or `quit`.
///
/// Every line shares `generator`, so the cache and the circuit breaker carry
/// over from one request to the next.
pub async fn run_session<R, W>(
    generator: &ContentGenerator,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let moods: Vec<String> = Mood::all().iter().map(ToString::to_string).collect();
    writeln!(out, "Moods: {}", moods.join(", "))?;
    writeln!(out, "Commands: clear, status, quit")?;
    out.flush()?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match SessionCommand::parse(line) {
            SessionCommand::Quit => break,
            SessionCommand::Clear => {
                generator.clear_cache();
                writeln!(out, "Cache cleared")?;
            }
            SessionCommand::Status => write_status(generator, out)?,
            SessionCommand::Generate(mood) => {
                match generator.generate_for_mood(mood).await {
                    GenerationResult::Success { content } => {
                        writeln!(out, "{} {}", mood.emoji(), mood.label())?;
                        writeln!(out, "{}", content.trim())?;
                    }
                    GenerationResult::Failure { message } => writeln!(out, "✗ {message}")?,
                }
                let remaining = generator.cooldown_remaining();
                if remaining > 0 {
                    writeln!(out, "  Circuit open, retry in {remaining}s")?;
                }
            }
            SessionCommand::Unknown(text) => {
                writeln!(out, "Unknown mood or command: {text}")?;
            }
        }
        out.flush()?;
    }

    Ok(())
}

fn write_status<W: Write>(generator: &ContentGenerator, out: &mut W) -> std::io::Result<()> {
    let state = match generator.circuit_state() {
        CircuitState::Closed => "closed",
        CircuitState::Open => "open",
        CircuitState::HalfOpen => "half-open",
    };
    writeln!(out, "Circuit: {state}")?;
    writeln!(out, "  Consecutive failures: {}", generator.consecutive_failures())?;
    let remaining = generator.cooldown_remaining();
    if remaining > 0 {
        writeln!(out, "  Retry in: {remaining}s")?;
    }
    writeln!(out, "  Cached moods: {}", generator.cached_moods())
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodlift_core::MoodliftConfig;
    use pretty_assertions::assert_eq;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::method;
    use wiremock::matchers::path;

    const BODY: &str = concat!(
        r#"{"response":"Sunshine looks ","done":false}"#,
        "\n",
        r#"{"response":"good on you.","done":true}"#,
        "\n",
    );

    fn generator_for(server: &MockServer) -> ContentGenerator {
        let mut config = MoodliftConfig::default();
        config.ollama.endpoint = server.uri();
        ContentGenerator::from_config(&config)
    }

    async fn run_lines(generator: &ContentGenerator, input: &str) -> String {
        let mut out = Vec::new();
        run_session(generator, input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(SessionCommand::parse("Happy"), SessionCommand::Generate(Mood::Happy));
        assert_eq!(SessionCommand::parse("CLEAR"), SessionCommand::Clear);
        assert_eq!(SessionCommand::parse("status"), SessionCommand::Status);
        assert_eq!(SessionCommand::parse("exit"), SessionCommand::Quit);
        assert_eq!(
            SessionCommand::parse("grumpy"),
            SessionCommand::Unknown("grumpy".to_string())
        );
    }

    #[tokio::test]
    async fn cache_persists_across_lines_until_cleared() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(BODY, "application/x-ndjson"))
            .expect(2)
            .mount(&server)
            .await;
        let generator = generator_for(&server);

        let output = run_lines(&generator, "happy\nHAPPY\nstatus\nclear\nhappy\nquit\nhappy\n").await;

        assert_eq!(output.matches("Sunshine looks good on you.").count(), 3);
        assert!(output.contains("Circuit: closed"));
        assert!(output.contains("Cached moods: 1"));
        assert!(output.contains("Cache cleared"));
    }

    #[tokio::test]
    async fn countdown_shown_once_circuit_opens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;
        let generator = generator_for(&server);

        let output = run_lines(&generator, "happy\ncalm\nmotivated\ncreative\nstatus\n").await;

        assert_eq!(output.matches("✗ AI service encountered an error").count(), 3);
        assert!(output.contains(
            "✗ Service temporarily unavailable. Please try again in a moment"
        ));
        assert!(output.contains("Circuit open, retry in 15s"));
        assert!(output.contains("Circuit: open"));
    }

    #[tokio::test]
    async fn unknown_input_is_reported() {
        let server = MockServer::start().await;
        let generator = generator_for(&server);

        let output = run_lines(&generator, "grumpy\n\n").await;

        assert!(output.contains("Unknown mood or command: grumpy"));
    }
}
