use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kn_lm_core::config::BuildConfig;
use kn_lm_core::io::build_output_path;
use kn_lm_core::model::builder::ModelBuilder;
use kn_lm_core::model::generator::Generator;
use kn_lm_core::model::discount::DiscountTable;
use kn_lm_core::model::kneser_ney::{KneserNey, Mode};
use kn_lm_core::persistence::{export_csv, read_counts, read_structured, write_counts, write_structured};
use kn_lm_core::tokenizer::{Tokenizer, WordTokenizer};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(about = "Builds modified Kneser-Ney n-gram models and generates sentences from them.")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Counts and smooths a corpus (one sentence per line)
    Build {
        /// The corpus to read
        corpus: PathBuf,

        /// The file to write the model to (defaults to the corpus path with a .bin extension)
        #[arg(long)]
        model: Option<PathBuf>,

        /// The highest n-gram order
        #[arg(long, default_value = "3")]
        order: usize,

        /// The maximum number of corpus lines to read
        #[arg(long, default_value = "200000")]
        max_lines: usize,

        /// The number of workers (0 means one per CPU)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Also export every n-gram probability to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also write the raw counts to this file
        #[arg(long)]
        counts: Option<PathBuf>,
    },

    /// Smooths previously written counts
    Smooth {
        /// The counts file written by `build --counts`
        counts: PathBuf,

        /// The file to write the model to
        #[arg(long)]
        model: PathBuf,

        /// The number of workers (0 means one per CPU)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Also export every n-gram probability to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Prints the smoothed log-probability of an n-gram
    Score {
        /// The counts file written by `build --counts`
        counts: PathBuf,

        /// The n-gram, as a sentence
        ngram: String,

        /// Back off to the best observed n-gram sharing the longest known suffix
        #[arg(long)]
        infer: bool,
    },

    /// Generates sentences from a model
    Generate {
        /// The model file
        model: PathBuf,

        /// The first word. Reads first words from stdin, one per line, if missing
        #[arg(long)]
        first_word: Option<String>,

        /// The maximum number of words per sentence
        #[arg(long, default_value = "50")]
        max_words: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Args::parse().command {
        Command::Build {
            corpus,
            model,
            order,
            max_lines,
            threads,
            csv,
            counts,
        } => {
            let config = BuildConfig { order, max_lines, threads };
            let builder = ModelBuilder::new(config, WordTokenizer)?;
            let ngram_counts = builder.count_file(&corpus)?;
            info!("Counted {} sentences", ngram_counts.sentences());
            if let Some(path) = counts {
                write_counts(&ngram_counts, path)?;
            }
            let trained = builder.smooth(ngram_counts)?;
            if let Some(path) = csv {
                export_csv(trained.probabilities(), path)?;
            }
            let model = match model {
                Some(path) => path,
                None => build_output_path(&corpus, "bin")?,
            };
            write_structured(trained.structured(), model)?;
        }
        Command::Smooth {
            counts,
            model,
            threads,
            csv,
        } => {
            let ngram_counts = read_counts(counts)?;
            let config = BuildConfig {
                order: ngram_counts.order(),
                threads,
                ..BuildConfig::default()
            };
            let trained = ModelBuilder::new(config, WordTokenizer)?.smooth(ngram_counts)?;
            if let Some(path) = csv {
                export_csv(trained.probabilities(), path)?;
            }
            write_structured(trained.structured(), model)?;
        }
        Command::Score { counts, ngram, infer } => {
            let ngram_counts = read_counts(counts)?;
            let tokens: Vec<String> = WordTokenizer
                .tokenize(&ngram)
                .iter()
                .map(|t| t.to_lowercase())
                .collect();
            if tokens.is_empty() {
                warn!("Nothing to score");
                return Ok(());
            }
            if tokens.len() > ngram_counts.order() {
                warn!("n-gram of order {} scored with counts of order {}", tokens.len(), ngram_counts.order());
            }
            let discounts = DiscountTable::estimate(ngram_counts.frequencies().values().copied())?;
            let kn = KneserNey::new(&ngram_counts, discounts);
            let mode = if infer { Mode::Infer } else { Mode::Train };
            println!("{}\t{}", tokens.join(" "), kn.probability(&tokens, mode).ln());
        }
        Command::Generate {
            model,
            first_word,
            max_words,
        } => {
            let model = read_structured(model)?;
            info!("Loaded a model of order {} with {} n-grams", model.order(), model.len());
            let generator = Generator::new(&model).with_max_words(max_words);

            if let Some(word) = first_word {
                match generator.generate(&word) {
                    Some(sentence) => println!("{}", sentence),
                    None => warn!("No sentence starts with '{}'", word),
                }
                return Ok(());
            }

            let stdin = io::stdin();
            let mut stdout = io::stdout();
            write!(stdout, "> ")?;
            stdout.flush()?;
            for line in stdin.lock().lines() {
                let line = line?;
                let word = line.trim();
                if word.is_empty() {
                    break;
                }
                match generator.generate(word) {
                    Some(sentence) => writeln!(stdout, "{}", sentence)?,
                    None => warn!("No sentence starts with '{}'", word),
                }
                write!(stdout, "> ")?;
                stdout.flush()?;
            }
        }
    }

    Ok(())
}
