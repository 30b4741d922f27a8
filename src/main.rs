use std::process::ExitCode;

fn main() -> ExitCode {
    bedrock_lib::run()
}
