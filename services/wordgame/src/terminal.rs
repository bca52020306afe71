//! Line-based terminal front end.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use wordgame_core::Command;
use wordgame_core::card::Attempt;
use wordgame_core::session_state::{Phase, UiCommand};

pub const HELP: &str = "Keys: [Enter] start/stop speaking, [s] start, [n] new round, [m] mistakes, [q] quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalInput {
    Ui(UiCommand),
    Quit,
}

pub fn parse_line(line: &str) -> Option<TerminalInput> {
    match line.trim().to_lowercase().as_str() {
        "" => Some(TerminalInput::Ui(UiCommand::ToggleListening)),
        "s" | "start" => Some(TerminalInput::Ui(UiCommand::StartRound)),
        "n" | "new" => Some(TerminalInput::Ui(UiCommand::StartNewRound)),
        "m" | "mistakes" => Some(TerminalInput::Ui(UiCommand::ShowMistakes)),
        "q" | "quit" | "exit" => Some(TerminalInput::Quit),
        _ => None,
    }
}

/// Reads stdin until EOF or quit, forwarding commands to the session.
pub async fn forward_stdin(ui_tx: mpsc::Sender<UiCommand>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Some(TerminalInput::Ui(command)) => {
                if ui_tx.send(command).await.is_err() {
                    tracing::error!("Session stopped accepting commands");
                    break;
                }
            }
            Some(TerminalInput::Quit) => break,
            None => println!("{HELP}"),
        }
    }
    Ok(())
}

/// Turns session commands into terminal lines.
#[derive(Debug, Default)]
pub struct Renderer {
    mistakes: Vec<Attempt>,
}

impl Renderer {
    pub fn render(&mut self, command: &Command) -> Vec<String> {
        match command {
            Command::PhaseChanged(Phase::ReviewingMistakes) => {
                let mut lines = vec!["Words to practise:".to_string()];
                lines.extend(self.mistakes.iter().map(|m| {
                    let said = if m.transcript.is_empty() {
                        "(nothing heard)"
                    } else {
                        m.transcript.as_str()
                    };
                    format!("  - {}: you said \"{}\"", m.card.word, said)
                }));
                lines
            }
            Command::PhaseChanged(phase) => phase_hint(*phase)
                .map(|hint| vec![hint.to_string()])
                .unwrap_or_default(),
            Command::CardShown {
                card,
                position,
                total,
                score,
            } => vec![format!(
                "Card {position}/{total} (score {score}): {}  [{}]",
                card.word,
                card.image.display_location()
            )],
            Command::Feedback(message) if message.is_empty() => Vec::new(),
            Command::Feedback(message) => vec![message.clone()],
            Command::PlayAudio(_) => Vec::new(),
            Command::RoundFinished {
                score,
                total,
                mistakes,
            } => {
                self.mistakes = mistakes.clone();
                let mut line = format!("Round finished: {score}/{total}.");
                if !mistakes.is_empty() {
                    line.push_str(" Press [m] to review your mistakes.");
                }
                vec![line, "Press [n] to play again.".to_string()]
            }
        }
    }
}

fn phase_hint(phase: Phase) -> Option<&'static str> {
    match phase {
        Phase::DisplayingCard => Some("Press [Enter] and say the word."),
        Phase::Listening => Some("Press [Enter] when you are done."),
        Phase::NoCardsAvailable => Some("Press [s] to try again."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordgame_core::card::{Card, CardId, ImageRef};

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("\n"), Some(TerminalInput::Ui(UiCommand::ToggleListening)));
        assert_eq!(parse_line(" M "), Some(TerminalInput::Ui(UiCommand::ShowMistakes)));
        assert_eq!(parse_line("n"), Some(TerminalInput::Ui(UiCommand::StartNewRound)));
        assert_eq!(parse_line("s"), Some(TerminalInput::Ui(UiCommand::StartRound)));
        assert_eq!(parse_line("q"), Some(TerminalInput::Quit));
        assert_eq!(parse_line("hello"), None);
    }

    #[test]
    fn test_render_round_and_mistakes() {
        let card = Card::new(CardId(0), "cat", ImageRef::Placeholder);
        let mut renderer = Renderer::default();

        let lines = renderer.render(&Command::CardShown {
            card: card.clone(),
            position: 1,
            total: 2,
            score: 0,
        });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Card 1/2 (score 0): cat"));

        let lines = renderer.render(&Command::RoundFinished {
            score: 1,
            total: 2,
            mistakes: vec![Attempt::judge(card, "")],
        });
        assert!(lines[0].contains("1/2"));
        assert!(lines[0].contains("[m]"));

        let lines = renderer.render(&Command::PhaseChanged(Phase::ReviewingMistakes));
        assert_eq!(lines[1], "  - cat: you said \"(nothing heard)\"");

        assert!(renderer.render(&Command::Feedback(String::new())).is_empty());
        assert!(renderer.render(&Command::PhaseChanged(Phase::Scoring)).is_empty());
    }
}
