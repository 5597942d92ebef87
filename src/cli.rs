use clap::Parser;

use crate::utils::version;

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
  #[arg(short, long, value_name = "FLOAT", help = "Tick rate, i.e. number of ticks per second", default_value_t = 4.0)]
  pub tick_rate: f64,

  #[arg(
    short('r'),
    long,
    value_name = "FLOAT",
    help = "Frame rate, i.e. number of frames per second",
    default_value_t = 30.0
  )]
  pub frame_rate: f64,

  #[arg(short('u'), long = "base-url", value_name = "URL", help = "Base url of the table API (overrides api.base_url)")]
  pub base_url: Option<String>,

  #[arg(
    short('c'),
    long = "cookie",
    value_name = "COOKIE",
    help = "Cookie header to send, e.g. 'session=...', to reuse a session that already has a database selected"
  )]
  pub cookie: Option<String>,

  #[arg(value_name = "TABLE", help = "Table to open on startup")]
  pub table: Option<String>,
}
