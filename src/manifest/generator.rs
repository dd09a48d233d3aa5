use crate::command::{CommandChain, CommandTemplate};
use crate::error::GenError;
use anyhow::Result;
use serde_yaml::Value;

/// Parse a generator spec: `null` (manual), one command string, or a
/// non-empty list of command strings forming a chain.
pub(crate) fn parse_generator(value: &Value, at: &str) -> Result<Option<CommandChain>> {
    let texts: Vec<&str> = match value {
        Value::Null => return Ok(None),
        Value::String(text) => vec![text.as_str()],
        Value::Sequence(items) => {
            if items.is_empty() {
                return Err(GenError::schema(at, "unexpected empty generator list").into());
            }
            items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| {
                        GenError::schema(
                            at,
                            format!("unexpected command {item:?}, expected a string"),
                        )
                    })
                })
                .collect::<std::result::Result<_, _>>()?
        }
        other => {
            return Err(
                GenError::schema(at, format!("unexpected generator {other:?}")).into(),
            )
        }
    };

    let commands = texts
        .into_iter()
        .map(|text| {
            CommandTemplate::parse(text).map_err(|err| GenError::schema(at, format!("{err:#}")))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Some(CommandChain::new(commands)?))
}
