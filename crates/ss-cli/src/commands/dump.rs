use std::path::Path;

pub fn run(file: &Path) -> Result<(), String> {
    let program = super::load_file(file)?;
    print!("{}", program.to_stream());
    Ok(())
}
