fn main() {
    if let Err(err) = wgpu_sprites::run() {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
