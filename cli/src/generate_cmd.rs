use clap::ArgGroup;
use clap::Parser;
use moodlift_core::ContentGenerator;
use moodlift_core::GenerationResult;
use moodlift_core::Mood;

use crate::GlobalArgs;
use crate::exit_codes;

#[derive(Debug, Parser)]
#[command(group(ArgGroup::new("input").required(true).args(["mood", "prompt"])))]
pub struct GenerateArgs {
    /// Mood to generate for (happy, calm, motivated, creative)
    #[arg(long, value_name = "MOOD")]
    pub mood: Option<Mood>,

    /// Free-form prompt; not cached
    #[arg(long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Output as JSON for automation
    #[arg(long)]
    pub json: bool,
}

pub async fn run(global: &GlobalArgs, args: GenerateArgs) -> i32 {
    let config = match global.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return exit_codes::CONFIG_ERROR;
        }
    };

    let generator = ContentGenerator::from_config(&config);
    let result = match (args.mood, args.prompt.as_deref()) {
        (Some(mood), _) => generator.generate_for_mood(mood).await,
        (None, Some(prompt)) => generator.generate_content(prompt, None).await,
        (None, None) => GenerationResult::failure("Nothing to generate: pass --mood or --prompt"),
    };

    print_result(&result, args.mood, args.json);
    if result.is_success() {
        exit_codes::SUCCESS
    } else {
        exit_codes::FAILURE
    }
}

fn print_result(result: &GenerationResult, mood: Option<Mood>, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(result).unwrap_or_default());
        return;
    }

    match result {
        GenerationResult::Success { content } => {
            if let Some(mood) = mood {
                println!("{} {}", mood.emoji(), mood.label());
            }
            println!("{}", content.trim());
        }
        GenerationResult::Failure { message } => eprintln!("✗ {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use crate::Command;

    fn parse(args: &[&str]) -> Result<GenerateArgs, clap::Error> {
        let mut argv = vec!["moodlift", "generate"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        match cli.command {
            Command::Generate(args) => Ok(args),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn mood_is_parsed_case_insensitively() {
        let args = parse(&["--mood", "Calm"]).unwrap();
        assert_eq!(args.mood, Some(Mood::Calm));
        assert!(!args.json);
    }

    #[test]
    fn requires_mood_or_prompt() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--mood", "happy", "--prompt", "hi"]).is_err());
        assert!(parse(&["--mood", "grumpy"]).is_err());
    }

    #[test]
    fn prompt_with_json() {
        let args = parse(&["--prompt", "Cheer me up", "--json"]).unwrap();
        assert_eq!(args.prompt.as_deref(), Some("Cheer me up"));
        assert!(args.json);
    }
}
