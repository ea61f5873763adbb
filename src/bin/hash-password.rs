/// Print a bcrypt hash suitable for ADMIN_PASSWORD_HASH.
///
/// Usage: hash-password [--cost N] [PASSWORD]
///   Reads the password from stdin when it is not given as an argument.

use std::io::{self, BufRead};

use clap::Parser;
use jobtrail_api::services::password;

#[derive(Parser)]
#[command(name = "hash-password", about = "Hash a password for the jobtrail admin account")]
struct Args {
    /// bcrypt cost factor
    #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
    cost: u32,

    /// Password to hash (read from stdin if omitted)
    password: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let plaintext = match args.password {
        Some(p) => p,
        None => {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if plaintext.is_empty() {
        anyhow::bail!("password must not be empty");
    }
    if !(password::MIN_COST..=31).contains(&args.cost) {
        anyhow::bail!("cost must be between {} and 31", password::MIN_COST);
    }

    println!("{}", password::hash_password(&plaintext, args.cost)?);
    Ok(())
}
