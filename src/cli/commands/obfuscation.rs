use crate::analysis::CancellationToken;
use crate::cli::OutputFormat;
use crate::cli::commands::{Envelope, load_session, print_envelope};
use anyhow::Result;
use std::path::PathBuf;

pub fn execute(
    module: PathBuf,
    config: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let session = load_session(&module, config.as_deref())?;
    let cancel = CancellationToken::new();
    let result = session.detect_obfuscation(&cancel);
    print_envelope(&Envelope::from_result(result), format)
}
