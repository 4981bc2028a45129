use anyhow::Result;
use saramsha_core::InputReference;
use saramsha_core::input::is_allowed_media_file;

pub fn run(input: &str, treat_as_text: bool) -> Result<()> {
    let reference = InputReference::classify(input, treat_as_text);
    println!("{}\t{}", reference.kind(), reference);

    if let InputReference::LocalFile(path) = &reference {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if !is_allowed_media_file(name) {
            eprintln!("Note: {name} does not have a recognized audio or video extension");
        }
    }
    Ok(())
}
