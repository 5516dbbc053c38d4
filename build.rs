fn main() {
    // Embed the Windows manifest that declares per-monitor DPI awareness so
    // GDI captures and window rectangles are reported in physical pixels.
    let _ = embed_resource::compile("snapmark.rc", embed_resource::NONE);
    println!("cargo:rerun-if-changed=snapmark.rc");
    println!("cargo:rerun-if-changed=snapmark.manifest");
}
