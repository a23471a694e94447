use std::env;

use sqlx::SqlitePool;

use locpack::export::ExportRequest;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (database, table, locale_column, output) = parse_args(&args);

    let pool = SqlitePool::connect(&database).await?;
    let request = ExportRequest::new(table, locale_column);

    let result = locpack::export_blob(pool, &request).await?;

    tokio::fs::write(&output, &result.blob).await?;
    println!("{}", serde_json::to_string_pretty(&result.summary)?);

    Ok(())
}

fn parse_args(args: &[String]) -> (String, String, String, String) {
    match args {
        [database, table, locale, output] => (
            database_url(database),
            table.clone(),
            locale.clone(),
            output.clone(),
        ),
        [table, locale, output] => match env::var("DATABASE_URL") {
            Ok(url) => (url, table.clone(), locale.clone(), output.clone()),
            Err(_) => {
                eprintln!("DATABASE_URL is not set and no <database> argument was given");
                usage()
            }
        },
        _ => usage(),
    }
}

/// Accept either a bare file path or a full sqlx URL.
fn database_url(database: &str) -> String {
    if database.starts_with("sqlite:") {
        database.to_string()
    } else {
        format!("sqlite:{}", database)
    }
}

fn usage() -> ! {
    eprintln!("Usage: locpack_export [<database>] <table> <locale_column> <output>");
    eprintln!("       omit <database> to use $DATABASE_URL (a .env file is honored)");
    eprintln!();
    eprintln!("Exports <table>'s <locale_column> strings into a binary blob at <output>");
    eprintln!("and prints the run summary as JSON on stdout.");
    std::process::exit(1);
}
