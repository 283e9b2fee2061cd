fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // libgit2 reads credentials and the registry through advapi32 on Windows
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "windows" {
        println!("cargo:rustc-link-lib=advapi32");
    }
}
