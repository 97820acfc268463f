use std::process::Command;

fn main() {
    // Only rebuild CSS when template or CSS files change
    println!("cargo:rerun-if-changed=assets/css/input.css");
    println!("cargo:rerun-if-changed=templates/");

    // Try to run Tailwind CSS standalone CLI
    let status = Command::new("tailwindcss")
        .args([
            "-i",
            "assets/css/input.css",
            "-o",
            "assets/css/output.css",
            "--minify",
        ])
        .status();

    match status {
        Ok(s) if s.success() => {
            println!("cargo:warning=Tailwind CSS compiled successfully");
        }
        _ => {
            // Tailwind CLI not available — create a minimal fallback CSS
            println!("cargo:warning=Tailwind CLI not found, using fallback CSS");
            let fallback = r#"*, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: system-ui, -apple-system, sans-serif; line-height: 1.6; color: #1c1917; background: #fafaf9; }
.container { max-width: 42rem; margin: 0 auto; padding: 0 1rem; }
nav { background: #fff; border-bottom: 1px solid #e7e5e4; padding: 0.75rem 0; margin-bottom: 1.5rem; }
nav .container { display: flex; align-items: center; gap: 1rem; }
nav .brand { font-weight: 700; font-size: 1.25rem; }
nav form.search { margin-left: auto; }
a { color: inherit; text-decoration: none; }
a:hover { opacity: 0.8; }
.card { background: #fff; border: 1px solid #e7e5e4; border-radius: 0.75rem; padding: 1.25rem; margin-bottom: 1rem; }
.card .meta { font-size: 0.875rem; color: #78716c; margin-bottom: 0.5rem; }
.card .body { white-space: pre-wrap; }
.card img { max-width: 100%; border-radius: 0.5rem; margin-top: 0.75rem; }
.flash { background: #ecfdf5; border: 1px solid #a7f3d0; border-radius: 0.5rem; padding: 0.75rem 1rem; margin-bottom: 1rem; }
.errors { background: #fef2f2; border: 1px solid #fecaca; border-radius: 0.5rem; padding: 0.75rem 1rem; margin-bottom: 1rem; color: #991b1b; }
.btn { display: inline-flex; align-items: center; padding: 0.5rem 1rem; border-radius: 0.5rem; font-size: 0.875rem; font-weight: 500; cursor: pointer; background: #1c1917; color: #fff; border: none; }
.btn:hover { background: #44403c; }
input, textarea { width: 100%; padding: 0.5rem 0.75rem; border: 1px solid #d6d3d1; border-radius: 0.5rem; font: inherit; margin-bottom: 0.75rem; }
label { display: block; font-size: 0.875rem; font-weight: 500; margin-bottom: 0.25rem; }
.muted { color: #78716c; font-size: 0.875rem; }
.pager { display: flex; justify-content: space-between; margin: 1.5rem 0; }
.avatar { width: 4rem; height: 4rem; border-radius: 9999px; object-fit: cover; }
"#;
            std::fs::create_dir_all("assets/css").ok();
            std::fs::write("assets/css/output.css", fallback).ok();
        }
    }
}
