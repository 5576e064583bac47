use std::env;
use std::path::{Path, PathBuf};

/// IDA releases whose default install locations are added as rpaths.
const IDA_VERSIONS: [&str; 2] = ["9.3", "9.2"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (install_path, ida_path, idalib_path) = idalib_build::idalib_install_paths_with(false);

    if ida_path.exists() && idalib_path.exists() {
        idalib_build::configure_linkage()?;
    } else {
        println!("cargo::warning=IDA installation not found, linking against SDK stubs");
        idalib_build::configure_idasdk_linkage();
    }

    add_rpath(&install_path);
    for path in default_install_paths() {
        if path != install_path {
            add_rpath(&path);
        }
    }

    Ok(())
}

/// Where IDA usually lives, so sdump runs without LD_LIBRARY_PATH or
/// DYLD_LIBRARY_PATH.
fn default_install_paths() -> Vec<PathBuf> {
    let os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    match os.as_str() {
        "macos" => IDA_VERSIONS
            .iter()
            .flat_map(|v| {
                ["Professional", "Pro", "Home", "Essential"].map(move |edition| {
                    PathBuf::from(format!("/Applications/IDA {edition} {v}.app/Contents/MacOS"))
                })
            })
            .collect(),
        "linux" => {
            let home = env::var("HOME").unwrap_or_else(|_| "/home/user".to_string());
            IDA_VERSIONS
                .iter()
                .flat_map(|v| {
                    [
                        format!("{home}/idapro-{v}"),
                        format!("{home}/ida-pro-{v}"),
                        format!("/opt/idapro-{v}"),
                        format!("/opt/ida-pro-{v}"),
                        format!("/usr/local/idapro-{v}"),
                    ]
                })
                .map(PathBuf::from)
                .collect()
        }
        _ => Vec::new(),
    }
}

fn add_rpath(path: &Path) {
    println!("cargo::rustc-link-arg=-Wl,-rpath,{}", path.display());
}
