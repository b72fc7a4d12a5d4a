//! `srag ask`: answer a prompt from the indexed material.

use anyhow::Result;

use crate::config::Config;
use crate::{db, services};

pub async fn run_ask(config: &Config, prompt: &str, user: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let responder = services::responder(config, &pool)?;

    let answer = responder.answer(prompt, user).await?;
    println!("{}", answer.text);

    if !answer.logged {
        eprintln!("warning: interaction was not recorded");
    }
    Ok(())
}
