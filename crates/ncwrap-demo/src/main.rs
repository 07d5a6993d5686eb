#![forbid(unsafe_code)]

//! ncwrap demo binary entry point.

use ncwrap::prelude::*;
use ncwrap_demo::app::App;
use ncwrap_demo::{cli, logging};

fn main() {
    let opts = cli::Opts::parse();
    if let Err(e) = logging::init(opts.log_file.as_deref()) {
        eprintln!("Logging disabled: {e}");
    }

    let options = InitOptions::from_env().with_mice(opts.mouse);
    let session = match Session::terminal(&options) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to initialize: {e}");
            std::process::exit(1);
        }
    };

    let result = App::new(&session, opts.start_demo, opts.image.as_deref())
        .and_then(|mut app| app.run(&session));
    drop(session);
    if let Err(e) = result {
        eprintln!("Runtime error: {e}");
        std::process::exit(1);
    }
}
