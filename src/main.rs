fn main() {
    if let Err(err) = bcmqa::cli::run() {
        let home_dir = bcmqa::platform::effective_home_dir().ok();
        bcmqa::ui::eprintln_error(&err, home_dir.as_deref());
        std::process::exit(bcmqa::exit::exit_code(&err));
    }
}
