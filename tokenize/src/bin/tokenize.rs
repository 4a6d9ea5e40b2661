use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Error};
use structopt::StructOpt;
use subword_tokenizers::{EncodeInput, EncodingOptions};
use tokenize::{Family, Model};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .without_time()
        .init();

    let cmd = Command::from_args();

    tracing::debug!(?cmd, "Starting");

    match cmd {
        Command::Encode(encode) => encode.execute(),
        Command::Decode(decode) => decode.execute(),
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Encode texts into model inputs, printing one JSON document per text.
    Encode(Encode),
    /// Decode token ids back into text.
    Decode(Decode),
}

#[derive(Debug, StructOpt)]
pub struct Encode {
    /// The directory containing the vocabulary and tokenizer configuration.
    #[structopt(long, parse(from_os_str))]
    model_dir: PathBuf,
    /// The tokenizer family ("wordpiece" or "bpe"), guessed from the files
    /// in the model directory by default.
    #[structopt(long)]
    family: Option<Family>,
    /// A JSON file with the encoding options (padding, truncation, ...).
    #[structopt(long, parse(from_os_str))]
    options: Option<PathBuf>,
    /// A second sequence to pair with every text.
    #[structopt(long)]
    pair: Option<String>,
    /// The texts to encode, as one batch.
    #[structopt(required = true)]
    texts: Vec<String>,
}

impl Encode {
    fn execute(self) -> Result<(), Error> {
        let model = Model::from_dir(&self.model_dir, self.family)
            .with_context(|| {
                format!(
                    "Unable to load a tokenizer from \"{}\"",
                    self.model_dir.display()
                )
            })?;

        let options = match &self.options {
            Some(path) => EncodingOptions::from_file(path).with_context(|| {
                format!(
                    "Unable to read the encoding options from \"{}\"",
                    path.display()
                )
            })?,
            None => EncodingOptions::default(),
        };

        let inputs: Vec<EncodeInput<'_>> = match &self.pair {
            Some(pair) => self
                .texts
                .iter()
                .map(|text| EncodeInput::from((text.as_str(), pair.as_str())))
                .collect(),
            None => self
                .texts
                .iter()
                .map(|text| EncodeInput::from(text.as_str()))
                .collect(),
        };

        let encoded = model.encode(&inputs, &options)?;

        let stdout = io::stdout();
        let mut stdout = stdout.lock();
        for sequence in &encoded {
            serde_json::to_writer(&mut stdout, sequence)
                .context("Unable to serialize the encoding")?;
            writeln!(stdout)?;
        }

        Ok(())
    }
}

#[derive(Debug, StructOpt)]
pub struct Decode {
    /// The directory containing the vocabulary and tokenizer configuration.
    #[structopt(long, parse(from_os_str))]
    model_dir: PathBuf,
    /// The tokenizer family ("wordpiece" or "bpe").
    #[structopt(long)]
    family: Option<Family>,
    /// Leave special tokens (and padding) out of the decoded text.
    #[structopt(long)]
    skip_special_tokens: bool,
    /// The token ids to decode.
    #[structopt(required = true)]
    ids: Vec<i64>,
}

impl Decode {
    fn execute(self) -> Result<(), Error> {
        let model = Model::from_dir(&self.model_dir, self.family)
            .with_context(|| {
                format!(
                    "Unable to load a tokenizer from \"{}\"",
                    self.model_dir.display()
                )
            })?;

        let text = model.decode(&self.ids, self.skip_special_tokens)?;
        println!("{}", text);

        Ok(())
    }
}
