//! Command templates and their deterministic interpolation.
//!
//! A template is the literal command text from the manifest. Interpolation turns
//! it into either a file copy or a program invocation, substituting `$PATH` and
//! `$SEED` tokens. The seed depends only on the literal text.
use crate::error::GenError;
use anyhow::Result;
use sha2::{Digest, Sha512};
use std::fmt;
use std::path::{Path, PathBuf};

/// Token replaced by the unit's relative, extension-stripped target path.
pub const PATH_PLACEHOLDER: &str = "$PATH";
/// Prefix of a token replaced by the command seed.
pub const SEED_PLACEHOLDER: &str = "$SEED";

const SEED_MODULUS: u32 = 1 << 31;

/// One literal command from the manifest, validated to tokenize to something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    original: String,
}

impl CommandTemplate {
    /// Validate and wrap a command string.
    pub fn parse(text: &str) -> Result<Self> {
        tokenize(text)?;
        Ok(Self {
            original: text.to_string(),
        })
    }

    /// Return the literal, unexpanded command text.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Return the deterministic seed for this template.
    pub fn seed(&self) -> u32 {
        seed_for(&self.original)
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// An ordered chain of commands; each step's output feeds the next step's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandChain {
    commands: Vec<CommandTemplate>,
}

impl CommandChain {
    /// Build a chain; an empty chain is rejected.
    pub fn new(commands: Vec<CommandTemplate>) -> Result<Self> {
        if commands.is_empty() {
            return Err(GenError::GeneratorSpec {
                command: String::new(),
                message: "empty command chain".to_string(),
            }
            .into());
        }
        Ok(Self { commands })
    }

    pub fn commands(&self) -> &[CommandTemplate] {
        &self.commands
    }
}

/// Values available to placeholders for one generation unit.
#[derive(Debug, Clone, Copy)]
pub struct InterpolationContext<'a> {
    /// Directory that program and copy paths are resolved against.
    pub base_dir: &'a Path,
    /// Relative target path with the extension stripped, e.g. `sample/1`.
    pub target: &'a str,
}

/// A concrete step ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Copy an existing file into the chain.
    Copy { source: PathBuf },
    /// Run a program with the given arguments.
    Program { program: PathBuf, args: Vec<String> },
}

/// Result of interpolating one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolated {
    pub step: Step,
    pub seed: u32,
}

/// Expand a template into a concrete step.
///
/// `$PATH` must be a whole token. Any token starting with `$SEED` is replaced
/// entirely by the seed, so `$SEEDxyz` becomes just the decimal seed and the
/// `xyz` suffix is dropped.
pub fn interpolate(
    template: &CommandTemplate,
    context: &InterpolationContext<'_>,
) -> Result<Interpolated> {
    let seed = template.seed();
    let mut tokens = tokenize(template.original())?;
    let program = tokens.remove(0);

    if tokens.is_empty() && program.ends_with(".in") {
        return Ok(Interpolated {
            step: Step::Copy {
                source: context.base_dir.join(program),
            },
            seed,
        });
    }

    let args = tokens
        .into_iter()
        .map(|token| {
            if token == PATH_PLACEHOLDER {
                context.target.to_string()
            } else if token.starts_with(SEED_PLACEHOLDER) {
                seed.to_string()
            } else {
                token
            }
        })
        .collect();
    Ok(Interpolated {
        step: Step::Program {
            program: context.base_dir.join(program),
            args,
        },
        seed,
    })
}

/// SHA-512 of the literal text, read as a big-endian integer, modulo 2^31.
pub fn seed_for(text: &str) -> u32 {
    let digest = Sha512::digest(text.as_bytes());
    let tail = &digest[digest.len() - 4..];
    let value = u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]);
    value % SEED_MODULUS
}

fn tokenize(text: &str) -> Result<Vec<String>> {
    let tokens = shell_words::split(text).map_err(|err| GenError::GeneratorSpec {
        command: text.to_string(),
        message: err.to_string(),
    })?;
    if tokens.is_empty() {
        return Err(GenError::GeneratorSpec {
            command: text.to_string(),
            message: "empty command".to_string(),
        }
        .into());
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::gen_error;

    fn context(base: &Path) -> InterpolationContext<'_> {
        InterpolationContext {
            base_dir: base,
            target: "sample/1",
        }
    }

    #[test]
    fn seed_is_pure_function_of_literal_text() {
        assert_eq!(seed_for("gen 1 $SEED"), seed_for("gen 1 $SEED"));
        assert_ne!(seed_for("gen 1 $SEED"), seed_for("gen  1 $SEED"));
        assert!(seed_for("anything") < SEED_MODULUS);
    }

    #[test]
    fn seed_matches_low_bits_of_sha512() {
        let digest = Sha512::digest(b"gen 1 $SEED");
        let mut low = 0u32;
        for byte in &digest[digest.len() - 4..] {
            low = (low << 8) | u32::from(*byte);
        }
        assert_eq!(seed_for("gen 1 $SEED"), low & 0x7fff_ffff);
    }

    #[test]
    fn interpolate_substitutes_path_and_seed_tokens() {
        let base = Path::new("/p/generators");
        let template = CommandTemplate::parse("gen.py --name $PATH --seed $SEED").expect("parse");
        let result = interpolate(&template, &context(base)).expect("interpolate");
        let seed = seed_for("gen.py --name $PATH --seed $SEED").to_string();
        assert_eq!(
            result.step,
            Step::Program {
                program: base.join("gen.py"),
                args: vec![
                    "--name".to_string(),
                    "sample/1".to_string(),
                    "--seed".to_string(),
                    seed,
                ],
            }
        );
    }

    #[test]
    fn seed_token_suffix_is_discarded() {
        let base = Path::new("/p");
        let template = CommandTemplate::parse("gen $SEED:2 x$SEED $PATHS").expect("parse");
        let result = interpolate(&template, &context(base)).expect("interpolate");
        let Step::Program { args, .. } = result.step else {
            panic!("expected program step");
        };
        assert_eq!(args[0], template.seed().to_string());
        assert_eq!(args[1], "x$SEED");
        assert_eq!(args[2], "$PATHS");
    }

    #[test]
    fn quoted_arguments_stay_single_tokens() {
        let base = Path::new("/p");
        let template = CommandTemplate::parse("gen 'two words' \"$PATH\"").expect("parse");
        let result = interpolate(&template, &context(base)).expect("interpolate");
        let Step::Program { args, .. } = result.step else {
            panic!("expected program step");
        };
        assert_eq!(args, vec!["two words".to_string(), "sample/1".to_string()]);
    }

    #[test]
    fn single_in_token_is_a_copy() {
        let base = Path::new("/p/generators");
        let template = CommandTemplate::parse("manual/hand.in").expect("parse");
        let result = interpolate(&template, &context(base)).expect("interpolate");
        assert_eq!(
            result.step,
            Step::Copy {
                source: base.join("manual/hand.in")
            }
        );
    }

    #[test]
    fn empty_and_unbalanced_commands_are_rejected() {
        for text in ["", "   ", "gen 'unterminated"] {
            let err = CommandTemplate::parse(text).unwrap_err();
            assert!(
                matches!(gen_error(&err), Some(GenError::GeneratorSpec { .. })),
                "{text:?} should be rejected as a command"
            );
        }
    }
}
