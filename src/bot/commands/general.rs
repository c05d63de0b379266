//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::Context,
        errors::Result,
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let help_text = "**Guild Economy Help**\n\n\
        **Economy**\n\
        • `/balance [user]` - Shows a wallet.\n\
        • `/gift <user> <amount>` - Sends money. Amount `0` sends everything. Suffixes like `50k` work.\n\
        • `/fish` - Goes fishing. Limited uses per hour.\n\
        • `/daily` - Claims the daily reward.\n\
        • `/shop buy` / `/shop sell` - Trades tools.\n\n\
        **Clans**\n\
        • `/clan create` - Starts the clan creation wizard.\n\
        • `/clan leave` - Leaves your clan.\n\
        • `/clan info` - Shows your clan.\n\n\
        **Connect 4**\n\
        • `/connect4 challenge <user> [wager]` - Challenges someone to a game.\n\
        • `/connect4 show` - Shows your latest game.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
