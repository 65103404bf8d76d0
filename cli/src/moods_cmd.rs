use clap::Parser;
use moodlift_core::Mood;
use serde::Serialize;

use crate::exit_codes;

#[derive(Debug, Parser)]
pub struct MoodsArgs {
    /// Output as JSON for automation
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct MoodEntry {
    mood: Mood,
    label: &'static str,
    emoji: &'static str,
    prompt: &'static str,
}

pub fn run(args: MoodsArgs) -> i32 {
    let entries: Vec<MoodEntry> = Mood::all()
        .into_iter()
        .map(|mood| MoodEntry {
            mood,
            label: mood.label(),
            emoji: mood.emoji(),
            prompt: mood.prompt(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries).unwrap_or_default());
    } else {
        for entry in &entries {
            println!("{} {:<10} {}", entry.emoji, entry.mood, entry.prompt);
        }
    }
    exit_codes::SUCCESS
}
