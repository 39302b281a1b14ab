use std::path::Path;

pub fn run(file: &Path) -> Result<(), String> {
    let program = super::load_file(file)?;

    println!("  All checks passed for '{}'.", file.display());
    println!(
        "  {} instructions, {} labels",
        program.len(),
        program.labels().len()
    );

    Ok(())
}
