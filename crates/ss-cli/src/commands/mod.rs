pub mod check;
pub mod dump;
pub mod run;

use std::fs;
use std::path::Path;

use ss_program::Program;
use ss_program::diagnostics::render_parse_error;

/// Read and load a compiled stream file, printing diagnostics to stderr.
fn load_file(file: &Path) -> Result<Program, String> {
    let source = fs::read_to_string(file)
        .map_err(|e| format!("cannot read {}: {e}", file.display()))?;

    match ss_program::load(&source) {
        Ok(program) => Ok(program),
        Err(err) => {
            let rendered = render_parse_error(&source, &file.display().to_string(), &err);
            eprint!("{rendered}");
            Err("the stream failed to load".into())
        }
    }
}
