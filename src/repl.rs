//! Terminal front-end — line-oriented chat loop.
//!
//! One message per line; per-message failures are printed and the loop
//! continues. `exit`, `quit`, or EOF ends the session.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::agent::Agent;
use crate::types::Result;

const PROMPT: &[u8] = b"you> ";

/// Run the chat loop until the user leaves.
pub async fn run(agent: &mut Agent) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let banner = format!(
        "Connected. {} tool(s) available: {}\nType 'exit' to quit.\n",
        agent.catalog().len(),
        agent.catalog().names().join(", ")
    );
    stdout.write_all(banner.as_bytes()).await?;

    loop {
        stdout.write_all(PROMPT).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        match agent.send_message(line).await {
            Ok(answer) => {
                stdout.write_all(answer.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            Err(e) => {
                stdout.write_all(format!("error: {}\n", e).as_bytes()).await?;
            }
        }
    }

    stdout.write_all(b"Bye!\n").await?;
    Ok(())
}
