//! Compile time configurations for the util crate
fn main() {
    // the ASSETHUB_PKG_NAME variable names the folder used under `~/.config`
    // for persisted registrations. Changing it orphans registrations stored
    // by earlier builds.
    println!("cargo::rustc-env=ASSETHUB_PKG_NAME=assethub");
}
