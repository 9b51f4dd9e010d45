//! Pocket Arena - Entry Point
//!
//! Sets up logging and the async runtime, starts a battle session and runs
//! a line-based terminal front end against it. The front end only reads
//! snapshots and submits moves; all battle rules live in the library.

use pocket_arena::battle::{BattleSession, BattleSnapshot, SessionHandle, TurnController, TurnPhase};
use pocket_arena::core::error::Result;
use pocket_arena::core::{ArenaConfig, Side};
use pocket_arena::creature::CreatureRegistry;
use pocket_arena::llm::{CommentaryGateway, LlmClient, LlmCommentator};

use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "pocket_arena.toml";

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pocket_arena=info")),
        )
        .init();

    tracing::info!("Pocket Arena starting...");

    let config = ArenaConfig::load_or_default(CONFIG_FILE)?;

    // Create the async runtime for the session and commentary calls
    let rt = Runtime::new()?;
    rt.block_on(play(config))
}

async fn play(config: ArenaConfig) -> Result<()> {
    let registry = CreatureRegistry::builtin();

    // Commentary is optional - battles work the same without it
    let gateway: Option<Arc<dyn CommentaryGateway>> = LlmClient::from_env().ok().map(|client| {
        tracing::info!("Commentary enabled ({})", client.model());
        Arc::new(LlmCommentator::new(client, config.commentary_language.clone()))
            as Arc<dyn CommentaryGateway>
    });

    let controller = TurnController::new(registry.clone(), &config);
    let (session, _task) = BattleSession::spawn(controller, gateway, &config);

    println!("\n=== POCKET ARENA ===");
    println!("A turn-based creature battle");
    println!();
    println!("Commands:");
    println!("  <id>        - Pick a creature and start a battle");
    println!("  1-4         - Use a move during your turn");
    println!("  exit        - Leave the current battle");
    println!("  quit / q    - Exit the game");
    println!();
    print_roster(&registry);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown_log = 0;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(input) = lines.next_line().await? else {
            break;
        };
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input == "quit" || input == "q" {
            break;
        }

        let snapshot = session.snapshot();

        if input == "exit" {
            session.abandon()?;
            shown_log = 0;
            println!("You left the battle.");
            print_roster(&registry);
            continue;
        }

        match snapshot.phase {
            TurnPhase::NotStarted | TurnPhase::GameOver => {
                let Ok(id) = input.parse::<u32>() else {
                    println!("Pick a creature by id.");
                    continue;
                };
                match session.initialize_battle(id).await {
                    Ok(_) => {
                        shown_log = 0;
                        let snapshot = wait_for_player(&session).await?;
                        shown_log = render(&snapshot, shown_log);
                    }
                    Err(e) => println!("{}", e),
                }
            }
            _ => {
                let Some(index) = input
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                else {
                    println!("Choose a move number.");
                    continue;
                };
                match session.submit_move(Side::Player, index).await? {
                    Ok(()) => {
                        let snapshot = wait_for_player(&session).await?;
                        shown_log = render(&snapshot, shown_log);
                    }
                    Err(rejection) => println!("Can't do that: {}", rejection),
                }
            }
        }
    }

    session.shutdown()?;
    println!("\nThanks for playing!");
    Ok(())
}

/// Wait until the player can act again (or the battle ends)
async fn wait_for_player(session: &SessionHandle) -> Result<BattleSnapshot> {
    session
        .wait_for(|s| matches!(s.phase, TurnPhase::PlayerTurn | TurnPhase::GameOver))
        .await
}

fn print_roster(registry: &CreatureRegistry) {
    println!("Choose your partner:");
    for template in registry.templates() {
        println!(
            "  [{:>3}] {:<12} {:<9} HP {:>3}  ATK {:>3}  DEF {:>3}",
            template.id,
            template.name,
            template.element,
            template.max_health,
            template.attack,
            template.defense
        );
    }
    println!();
}

/// Print the battle and any log lines not yet shown. Returns lines shown.
fn render(snapshot: &BattleSnapshot, shown_log: usize) -> usize {
    let Some(battle) = &snapshot.battle else {
        return shown_log;
    };

    for line in battle.log.iter().skip(shown_log) {
        println!("  » {}", line);
    }

    println!();
    for side in [Side::Opponent, Side::Player] {
        let p = battle.participant(side);
        println!(
            "  {:<12} [{:<20}] {:>3}/{}",
            p.name,
            "#".repeat((p.health_fraction() * 20.0).round() as usize),
            p.current_health,
            p.max_health
        );
    }
    println!();

    match (snapshot.phase, battle.winner) {
        (TurnPhase::GameOver, Some(Side::Player)) => {
            println!("Victory! {} won the battle!", battle.player.name);
            println!("Pick another creature to play again.");
        }
        (TurnPhase::GameOver, _) => {
            println!("Defeat! {} beat you!", battle.opponent.name);
            println!("Pick another creature to play again.");
        }
        _ => {
            println!("Your turn:");
            for (i, m) in battle.player.moves.iter().enumerate() {
                println!("  {}. {:<14} {:<9} Power: {}", i + 1, m.name, m.element, m.power);
            }
        }
    }

    battle.log.len()
}
