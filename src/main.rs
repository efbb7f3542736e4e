use anyhow::{bail, Result};
use env_logger::Env;

use linhash::csv_source;
use linhash::index::LinearHashIndex;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = std::env::args().collect::<Vec<_>>();
    match args.len() {
        0 | 1 => bail!("Missing <command>"),
        2 => bail!("Missing arguments for command"),
        _ => {}
    }

    let command = &args[1];
    match command.as_str() {
        "build" => {
            if args.len() < 4 {
                bail!("Usage: linhash build <csv-path> <index-path>");
            }
            let csv_path = &args[2];
            let index_path = &args[3];

            let records = csv_source::read_records(csv_path)?;
            let mut index = LinearHashIndex::create(index_path)?;
            for record in records {
                index.insert(record)?;
            }
            index.flush()?;

            println!(
                "Indexed {} records into {} ({} pages, {} buckets, level {})",
                index.num_records(),
                index_path,
                index.num_pages(),
                index.bucket_count(),
                index.level(),
            );
        }
        "lookup" => {
            if args.len() < 4 {
                bail!("Usage: linhash lookup <index-path> <id>");
            }
            let index_path = &args[2];
            let id: i64 = args[3].parse()?;

            let mut index = LinearHashIndex::open(index_path)?;
            match index.lookup(id)? {
                Some(record) => println!("{record:?}"),
                None => println!("not found"),
            }
        }
        _ => bail!("Unknown command: {command}"),
    }

    Ok(())
}
