fn main() {
    if let Err(err) = virtual_mouse_lib::run() {
        log::error!("virtual mouse failed: {err:?}");
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
