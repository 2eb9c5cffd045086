// streamwatch-server/src/commands.rs

use streamwatch_common::models::platform::Platform;

use crate::context::StoreContext;
use crate::{Args, Command};

/// Registry maintenance commands; they never touch the network.
pub async fn handle(args: &Args, command: Command) -> anyhow::Result<()> {
    let ctx = StoreContext::new(args).await?;

    match command {
        Command::Add { platform, service_id, member_id } => {
            if ctx.registry.add(platform, &service_id, &member_id).await? {
                println!("Now tracking {}:{}", platform, service_id.trim());
            } else {
                println!("{}:{} is already tracked", platform, service_id.trim());
            }
        }
        Command::Remove { platform, service_id, member_id } => {
            match member_id {
                Some(member) => {
                    ctx.registry.remove_for_member(platform, &service_id, &member, false).await?
                }
                None => ctx.registry.remove(platform, &service_id).await?,
            }
            println!("Removed {}:{}", platform, service_id.trim());
        }
        Command::List { platform } => {
            let platforms: Vec<Platform> = match platform {
                Some(p) => vec![p],
                None => Platform::ALL.to_vec(),
            };
            for p in platforms {
                for rec in ctx.registry.all(p).await {
                    println!("{}", serde_json::to_string(&rec)?);
                }
            }
        }
        Command::Run { .. } => anyhow::bail!("`run` is not a registry command"),
    }

    ctx.db.pool().close().await;
    Ok(())
}
