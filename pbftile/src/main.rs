use std::{
    io::{self, Read, Write},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use vector_tile::error::Error;

#[derive(Debug, Parser)]
#[command(
    name = "pbftile",
    disable_help_subcommand = true,
    about = "Reads a .pbf map tile from stdin and outputs pretty-printed JSON",
    after_help = "Example: pmtiles tile ./static/colorado.pmtiles 12 849 1550 | pbftile decode"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Decode a tile read from stdin (default)
    Decode,
}

fn decode<R: Read>(input: &mut R) -> Result<String, Error> {
    let tile = vector_tile::parse_tile_reader(input)?;
    log::info!("decoded {} layers", tile.layers().len());
    vector_tile::to_json_pretty(&tile)
}

/// Decodes `input` and writes the JSON followed by a newline to `output`. On failure nothing
/// is written to `output` and a single line goes to `errors`. Returns the exit status.
fn run<R: Read, W: Write, E: Write>(input: &mut R, output: &mut W, errors: &mut E) -> u8 {
    let message = match decode(input) {
        Ok(json) => match writeln!(output, "{json}").and_then(|()| output.flush()) {
            Ok(()) => return 0,
            Err(e) => format!("error writing output: {e}"),
        },
        Err(e) => e.to_string(),
    };

    // Nothing sensible is left to do if stderr is gone too.
    let _ = writeln!(errors, "{message}");
    1
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let cli = Cli::parse();

    let status = match cli.command.unwrap_or(Command::Decode) {
        Command::Decode => run(
            &mut io::stdin().lock(),
            &mut io::stdout().lock(),
            &mut io::stderr().lock(),
        ),
    };

    ExitCode::from(status)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use clap::{error::ErrorKind, Parser};

    use super::{run, Cli, Command};

    /// A tile with one layer `roads` holding a single two point line.
    const ROADS_TILE: [u8; 23] = [
        0x1a, 0x15, 0x78, 0x02, 0x0a, 0x05, b'r', b'o', b'a', b'd', b's', 0x12, 0x0a, 0x18,
        0x02, 0x22, 0x06, 0x09, 0x04, 0x04, 0x0a, 0x0a, 0x00,
    ];

    fn run_with(input: &[u8]) -> (u8, String, String) {
        let mut output = Vec::new();
        let mut errors = Vec::new();
        let status = run(&mut Cursor::new(input.to_vec()), &mut output, &mut errors);
        (
            status,
            String::from_utf8(output).unwrap(),
            String::from_utf8(errors).unwrap(),
        )
    }

    #[test]
    fn test_decode_subcommand() {
        let cli = Cli::try_parse_from(["pbftile", "decode"]).unwrap();
        assert_eq!(cli.command, Some(Command::Decode));
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["pbftile"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_help() {
        for flag in ["-h", "--help"] {
            let err = Cli::try_parse_from(["pbftile", flag]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
            let help = err.to_string();
            assert!(help.contains("pbftile decode"));
            assert!(!help.contains("--version"));
        }
    }

    #[test]
    fn test_unknown_argument() {
        let err = Cli::try_parse_from(["pbftile", "encode"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_only_decode_is_accepted() {
        assert!(Cli::try_parse_from(["pbftile", "decode", "--pretty"]).is_err());
        assert!(Cli::try_parse_from(["pbftile", "help"]).is_err());
        assert!(Cli::try_parse_from(["pbftile", "--version"]).is_err());
    }

    #[test]
    fn test_run_writes_json_line() {
        let (status, output, errors) = run_with(&ROADS_TILE);
        assert_eq!(status, 0);
        assert!(errors.is_empty());
        assert!(output.starts_with("{\n  \"roads\": {"), "{output}");
        assert!(output.ends_with("}\n"));
        assert!(!output.ends_with("\n\n"));
    }

    #[test]
    fn test_run_failure() {
        for input in [&[0u8; 0][..], &[0x1f, 0x8b, 0x00][..], &[0x1a, 0x05][..]] {
            let (status, output, errors) = run_with(input);
            assert_ne!(status, 0);
            assert!(output.is_empty());
            assert_eq!(errors.lines().count(), 1, "{errors}");
        }
    }
}
