use anyhow::{Context, Result};
use clap::Parser;
use gemini_genai::GeminiClient;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoLocal;
use wordgame_core::Command;
use wordgame_core::card_source::{CardSource, GeneratedCardSource, StaticCardSource};
use wordgame_core::session_state::{RoundSession, UiCommand};
use wordgame_core::speech::SpeechAudio;
use wordgame_native_utils::audio::SPEECH_PCM16_SAMPLE_RATE;
use wordgame_native_utils::player::AudioPlayer;
use wordgame_service::config::Config;
use wordgame_service::gemini_adapter::GeminiAdapter;
use wordgame_service::microphone::Microphone;
use wordgame_service::prompt_loader::Prompts;
use wordgame_service::terminal::{self, Renderer};

#[derive(Parser)]
#[command(version, about = "Picture word game for young children")]
struct Cli {
    /// Overrides MAX_CARDS_PER_ROUND
    #[arg(long)]
    max_cards: Option<usize>,
    /// Play a fixed word list with placeholder pictures instead of generating cards
    #[arg(long)]
    offline: bool,
    /// Words for offline play, comma separated
    #[arg(long, value_delimiter = ',', requires = "offline")]
    words: Vec<String>,
    #[arg(long)]
    input_device: Option<String>,
    #[arg(long)]
    output_device: Option<String>,
    /// Print the available audio devices and exit
    #[arg(long)]
    list_devices: bool,
    /// Directory holding the prompt templates
    #[arg(long)]
    prompts: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Parse Command-Line Arguments ---
    let args = Cli::parse();

    if args.list_devices {
        println!("Inputs:\n{}", wordgame_native_utils::device::get_available_inputs()?);
        println!("Outputs:\n{}", wordgame_native_utils::device::get_available_outputs()?);
        return Ok(());
    }

    // --- 2. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 3. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    // --- 4. Load Prompts ---
    let prompts_dir = args
        .prompts
        .clone()
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts")));
    let prompts = Prompts::load(&prompts_dir).context("Failed to load prompts")?;
    tracing::info!("Loaded prompts from {}", prompts_dir.display());

    // --- 5. Initialize API Client ---
    let client = GeminiClient::new(config.gemini_config())?;
    let adapter = Arc::new(GeminiAdapter::new(client, prompts, config.image_dir.clone()));

    // --- 6. Session Setup ---
    let mut game_config = config.game_config();
    if let Some(max_cards) = args.max_cards {
        game_config.max_cards_per_round = max_cards;
    }

    let card_source: Arc<dyn CardSource> = if args.offline {
        if args.words.is_empty() {
            Arc::new(StaticCardSource::default())
        } else {
            Arc::new(StaticCardSource::new(args.words.clone()))
        }
    } else {
        Arc::new(GeneratedCardSource::new(
            adapter.clone(),
            adapter.clone(),
            game_config.request_timeout,
        ))
    };

    let (ui_tx, mut ui_rx) = tokio::sync::mpsc::channel::<UiCommand>(32);
    let (command_tx, mut command_rx) = tokio::sync::mpsc::channel::<Command>(32);

    let mut session = RoundSession::new(
        game_config,
        card_source,
        adapter,
        Box::new(Microphone::new(args.input_device.clone())),
        command_tx,
    );

    let mut player = match AudioPlayer::new(args.output_device.as_deref()) {
        Ok(player) => Some(player),
        Err(e) => {
            tracing::warn!("Audio output unavailable, continuing without sound: {:#}", e);
            None
        }
    };

    println!("{}", terminal::HELP);
    ui_tx
        .send(UiCommand::StartRound)
        .await
        .context("Failed to start the first round")?;
    let stdin_handle = tokio::spawn(terminal::forward_stdin(ui_tx));

    // Executes side effects requested by the session.
    let command_handler = async {
        let mut renderer = Renderer::default();
        while let Some(command) = command_rx.recv().await {
            for line in renderer.render(&command) {
                println!("{line}");
            }
            if let (Command::PlayAudio(audio), Some(player)) = (&command, player.as_mut()) {
                play(player, audio);
            }
        }
    };

    tokio::select! {
        result = session.run(&mut ui_rx) => {
            result.context("Round session failed")?;
        }
        _ = command_handler => {}
        result = stdin_handle => {
            if let Ok(Err(e)) = result {
                tracing::error!("Error reading terminal input: {:?}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
        }
    }
    tracing::info!("Shutting down...");
    Ok(())
}

fn play(player: &mut AudioPlayer, audio: &SpeechAudio) {
    let rate = audio
        .sample_rate
        .unwrap_or(SPEECH_PCM16_SAMPLE_RATE as u32);
    match player.play_pcm16(&audio.bytes, rate) {
        Ok(queued) => tracing::debug!("Queued {} samples for playback", queued),
        Err(e) => tracing::warn!("Failed to play {}: {:#}", audio.mime_type, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_devices_parses_without_other_flags() {
        let args = Cli::try_parse_from(["wordgame", "--list-devices"]).unwrap();
        assert!(args.list_devices);
        assert!(!args.offline);
        assert!(args.max_cards.is_none());
    }

    #[test]
    fn test_words_require_offline() {
        assert!(Cli::try_parse_from(["wordgame", "--words", "cat,dog"]).is_err());
        let args = Cli::try_parse_from(["wordgame", "--offline", "--words", "cat,dog"]).unwrap();
        assert_eq!(args.words, vec!["cat", "dog"]);
    }
}
