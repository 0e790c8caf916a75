//! Side-by-side comparison of the two WebP engines.
//!
//! Encodes each given JPEG/PNG with libwebp and with the pure-Rust encoder at
//! a few quality settings and prints output size and timing. Outputs are kept
//! for visual inspection.
//!
//! ```sh
//! cargo run --example compare_engines -- photo.jpg logo.png
//! open /tmp/webp-ingest-compare
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;
use webp_ingest::imaging::{
    EncodeParams, LibwebpBackend, Quality, RustBackend, WebpEncoder, probe_format,
};
use webp_ingest::output::format_bytes;

const OUTPUT_DIR: &str = "/tmp/webp-ingest-compare";
const QUALITIES: &[u32] = &[60, 80, 100];

fn file_bytes(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn main() {
    let sources: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if sources.is_empty() {
        eprintln!("Usage: compare_engines <image>...");
        std::process::exit(1);
    }

    let _ = std::fs::remove_dir_all(OUTPUT_DIR);
    std::fs::create_dir_all(OUTPUT_DIR).unwrap();

    let engines: [&dyn WebpEncoder; 2] = [&LibwebpBackend::new(), &RustBackend::new()];

    for source in &sources {
        let format = match probe_format(source) {
            Ok(f) if f.is_supported() => f,
            Ok(f) => {
                println!("\n=== {} === skipped ({})", source.display(), f);
                continue;
            }
            Err(e) => {
                println!("\n=== {} === unreadable: {}", source.display(), e);
                continue;
            }
        };
        let stem = source.file_stem().unwrap().to_string_lossy().to_string();
        let original = file_bytes(source);
        let (w, h) = image::image_dimensions(source).unwrap();
        println!(
            "\n=== {} === {} {}x{}, {}",
            stem,
            format,
            w,
            h,
            format_bytes(original)
        );

        for &q in QUALITIES {
            let mut cells = Vec::new();
            for engine in engines {
                let output = PathBuf::from(format!(
                    "{}/{}_q{}_{}.webp",
                    OUTPUT_DIR,
                    stem,
                    q,
                    engine.name()
                ));
                let params = EncodeParams {
                    source: source.clone(),
                    format,
                    output: output.clone(),
                    quality: Quality::new(q),
                };
                let t = Instant::now();
                match engine.encode(&params) {
                    Ok(()) => cells.push(format!(
                        "{}={}/{}ms",
                        engine.name(),
                        format_bytes(file_bytes(&output)),
                        t.elapsed().as_millis()
                    )),
                    Err(e) => cells.push(format!("{}=error ({})", engine.name(), e)),
                }
            }
            println!("  q{:<3} {}", q, cells.join("  "));
        }
    }

    println!("\nOutputs in {}", OUTPUT_DIR);
}
