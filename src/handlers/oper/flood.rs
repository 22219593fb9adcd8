use async_trait::async_trait;
use lobby_proto::ParsedArgs;
use tracing::info;

use crate::handlers::core::{Context, Handler, HandlerError, HandlerResult};
use crate::handlers::helpers::server_msg;
use crate::security::FloodParameter;

/// Handler for FLOODLEVEL command.
///
/// `FLOODLEVEL <PERIOD|USER|BOT> <value>`
pub struct FloodLevelHandler;

#[async_trait]
impl Handler for FloodLevelHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let name = args.text(0)?;
        let value = args.int(1)?;

        let parameter: FloodParameter = name.parse().map_err(|()| {
            HandlerError::Precondition(format!(
                "Unknown flood parameter {name} (expected PERIOD, USER or BOT)"
            ))
        })?;
        let value = u64::try_from(value)
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                HandlerError::Precondition(format!(
                    "Flood parameter {name} must be positive, got {value}"
                ))
            })?;

        ctx.lobby.flood.set(parameter, value);

        let confirmation = match parameter {
            FloodParameter::Period => format!("Flood record period set to {value} seconds"),
            FloodParameter::User => format!("Flood threshold for users set to {value} bytes"),
            FloodParameter::Bot => format!("Flood threshold for bots set to {value} bytes"),
        };
        ctx.reply(server_msg(&confirmation));
        info!(admin = %ctx.username(), parameter = %name, value, "Flood level changed");
        Ok(())
    }
}
