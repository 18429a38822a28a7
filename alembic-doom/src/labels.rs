//! Distillation labels
//!
//! The teacher model answers with one JSON object per line, each a user
//! command suited to the game situation. This module assembles the
//! elicitation prompt, parses the ordered run output into command
//! records, and persists them.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use alembic_core::domain::OrderedOutput;

/// One elicited user command, tied to the snapshot it was produced for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCommand {
    pub command: String,
    pub game_state_idx: usize,
    pub intent: String,
    pub explicitness: String,
    pub atomicity: String,
    pub contextuality: String,
}

#[derive(Debug, Deserialize)]
struct LabelLine {
    command: String,
    intent: String,
    explicitness: String,
    atomicity: String,
    contextuality: String,
}

/// Parses the ordered run output into user commands.
///
/// Each result entry may carry several lines, each line one command
/// object. Malformed lines are skipped with a warning: one bad model
/// answer must not cost the rest of the dataset.
pub fn parse_user_commands(output: &OrderedOutput) -> Vec<UserCommand> {
    let mut commands = Vec::new();

    for (index, entries) in output.filled() {
        for entry in entries {
            for line in entry.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match serde_json::from_str::<LabelLine>(line) {
                    Ok(label) => commands.push(UserCommand {
                        command: label.command,
                        game_state_idx: index,
                        intent: label.intent,
                        explicitness: label.explicitness,
                        atomicity: label.atomicity,
                        contextuality: label.contextuality,
                    }),
                    Err(e) => {
                        warn!(index, error = %e, "skipping malformed label line");
                    }
                }
            }
        }
    }

    commands
}

/// Persists commands as a pretty-printed JSON array
pub fn save_user_commands(path: impl AsRef<Path>, commands: &[UserCommand]) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), commands)
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

/// Substitutes `<tag>` placeholders in the base prompt.
///
/// String values substitute directly; arrays are joined with newlines.
pub fn apply_prompt_data(base: &str, data: &serde_json::Map<String, Value>) -> String {
    let mut prompt = base.to_string();
    for (tag, value) in data {
        let replacement = match value {
            Value::String(text) => text.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        };
        prompt = prompt.replace(&format!("<{tag}>"), &replacement);
    }
    prompt
}

/// Loads a prompt-data file and applies it to the base prompt
pub fn build_full_prompt(base: &str, data_path: &Path) -> anyhow::Result<String> {
    let file = File::open(data_path)
        .with_context(|| format!("cannot open {}", data_path.display()))?;
    let data: serde_json::Map<String, Value> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse {}", data_path.display()))?;
    Ok(apply_prompt_data(base, &data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(command: &str) -> String {
        format!(
            r#"{{"command":"{command}","intent":"attack","explicitness":"explicit","atomicity":"atomic","contextuality":"contextual"}}"#
        )
    }

    #[test]
    fn parses_one_command_per_line() {
        let output = OrderedOutput::from_slots(vec![
            Some(vec![format!("{}\n{}", label("fire"), label("reload"))]),
            None,
            Some(vec![label("duck")]),
        ]);

        let commands = parse_user_commands(&output);
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].command, "fire");
        assert_eq!(commands[0].game_state_idx, 0);
        assert_eq!(commands[1].command, "reload");
        assert_eq!(commands[1].game_state_idx, 0);
        assert_eq!(commands[2].command, "duck");
        assert_eq!(commands[2].game_state_idx, 2);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let output = OrderedOutput::from_slots(vec![Some(vec![format!(
            "not json\n{}\n\n",
            label("strafe")
        )])]);

        let commands = parse_user_commands(&output);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command, "strafe");
    }

    #[test]
    fn save_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user-commands.json");

        let commands = vec![UserCommand {
            command: "open the door".to_string(),
            game_state_idx: 3,
            intent: "interact".to_string(),
            explicitness: "explicit".to_string(),
            atomicity: "atomic".to_string(),
            contextuality: "contextual".to_string(),
        }];

        save_user_commands(&path, &commands).unwrap();

        let loaded: Vec<UserCommand> =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(loaded, commands);
    }

    #[test]
    fn prompt_tags_substitute_strings_and_arrays() {
        let mut data = serde_json::Map::new();
        data.insert("game".to_string(), Value::String("Doom".to_string()));
        data.insert(
            "rules".to_string(),
            Value::Array(vec![
                Value::String("be brief".to_string()),
                Value::String("be bold".to_string()),
            ]),
        );

        let prompt = apply_prompt_data("Playing <game>.\n<rules>\nUnknown: <other>", &data);
        assert_eq!(prompt, "Playing Doom.\nbe brief\nbe bold\nUnknown: <other>");
    }
}
