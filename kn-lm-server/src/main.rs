use std::path::PathBuf;
use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use kn_lm_core::config::BuildConfig;
use kn_lm_core::io::{get_filename, list_files, normalize_folder};
use kn_lm_core::model::generator::Generator;
use kn_lm_core::model::structured::StructuredModel;
use kn_lm_core::persistence::load_or_build;
use kn_lm_core::tokenizer::WordTokenizer;
use serde::Deserialize;

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	first_word: Option<String>, // -> random vocabulary word if missing
	max_words: Option<usize>,
}

/// Query parameters for the `/v1/best_next` endpoint
#[derive(Deserialize)]
struct BestNextParams {
	prefix: String, // comma separated tokens
	order: Option<usize>,
}

/// Query parameters for the `/v1/load_model` endpoint, defaults from [`BuildConfig`]
#[derive(Deserialize)]
struct LoadQuery {
	name: Option<String>,
	order: Option<usize>,
	max_lines: Option<usize>,
	threads: Option<usize>,
}

impl LoadQuery {
	fn config(&self) -> BuildConfig {
		let default = BuildConfig::default();
		BuildConfig {
			order: self.order.unwrap_or(default.order),
			max_lines: self.max_lines.unwrap_or(default.max_lines),
			threads: self.threads.unwrap_or(default.threads),
		}
	}
}

struct SharedData {
	data_dir: PathBuf,
	name: Option<String>,
	model: StructuredModel,
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a sentence from the loaded model, starting with `first_word`.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<RwLock<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let mut generator = Generator::new(&shared_data.model);
	if let Some(max_words) = query.max_words {
		generator = generator.with_max_words(max_words);
	}

	let first_word = match &query.first_word {
		Some(w) if !w.trim().is_empty() => w.trim().to_owned(),
		_ => match generator.random_first_word() {
			Some(w) => w.to_owned(),
			None => return HttpResponse::NotFound().body("No model loaded"),
		},
	};

	match generator.generate(&first_word) {
		Some(sentence) => HttpResponse::Ok().body(sentence),
		None => HttpResponse::NotFound().body(format!("No sentence starts with '{first_word}'")),
	}
}

/// HTTP GET endpoint `/v1/best_next`
///
/// Returns `word<TAB>log_probability` for the most probable continuation.
#[get("/v1/best_next")]
async fn get_best_next(data: web::Data<RwLock<SharedData>>, query: web::Query<BestNextParams>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let prefix: Vec<String> = query
		.prefix
		.split(',')
		.map(|s| s.trim().to_lowercase())
		.filter(|s| !s.is_empty())
		.collect();
	let order = query.order.unwrap_or(shared_data.model.order());

	match shared_data.model.best_next_with_backoff(&prefix, order) {
		Some((word, log_prob)) => HttpResponse::Ok().body(format!("{word}\t{log_prob}")),
		None => HttpResponse::NotFound().body("No match"),
	}
}

/// HTTP GET endpoint `/v1/corpora`: corpus files available in the data folder
#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let data_dir = match data.read() {
		Ok(m) => m.data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match list_files(&data_dir, "txt") {
		Ok(files) => {
			let names: Vec<String> = files.iter().filter_map(|f| get_filename(f).ok()).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

#[get("/v1/loaded_model")]
async fn get_loaded_model(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match &shared_data.name {
		Some(name) => HttpResponse::Ok().body(format!("{name}\t{}", shared_data.model.order())),
		None => HttpResponse::NotFound().body("No model loaded"),
	}
}

/// HTTP PUT endpoint `/v1/load_model`
///
/// Loads `data/<name>.bin` or builds it from `data/<name>.txt`, using the
/// `order`, `max_lines` and `threads` query parameters.
#[put("/v1/load_model")]
async fn put_model(data: web::Data<RwLock<SharedData>>, query: web::Query<LoadQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};
	let config = query.config();
	if let Err(e) = config.validate() {
		return HttpResponse::BadRequest().body(e.to_string());
	}

	let corpus = match data.read() {
		Ok(m) => m.data_dir.join(format!("{name}.txt")),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	// Building may take a while: keep the lock free meanwhile
	let built = web::block(move || load_or_build(corpus, config, WordTokenizer)).await;
	let model = match built {
		Ok(Ok(model)) => model,
		Ok(Err(e)) => return HttpResponse::InternalServerError().body(format!("Failed to load model: {e}")),
		Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load model: {e}")),
	};

	let mut shared_data = match data.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	log::info!("Loaded model '{}' of order {}", name, model.order());
	shared_data.name = Some(name);
	shared_data.model = model;

	HttpResponse::Ok().body("Model loaded successfully")
}

/// Main entry point for the server.
///
/// Serves the model over HTTP on 127.0.0.1:5000. The data folder is the first
/// argument (default `./data`); if it holds a single corpus, it is loaded at
/// startup with the default configuration.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let data_dir = normalize_folder(&std::env::args().nth(1).unwrap_or_else(|| "./data".to_owned()));
	let mut shared_data = SharedData {
		data_dir: data_dir.clone(),
		name: None,
		model: StructuredModel::default(),
	};

	if let Ok(files) = list_files(&data_dir, "txt") {
		if let [file] = files.as_slice() {
			let corpus = data_dir.join(file);
			match load_or_build(&corpus, BuildConfig::default(), WordTokenizer) {
				Ok(model) => {
					shared_data.name = get_filename(&corpus).ok();
					shared_data.model = model;
				}
				Err(e) => log::warn!("Failed to load {}: {}", corpus.display(), e),
			}
		}
	}
	let shared_model = web::Data::new(RwLock::new(shared_data));

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(get_best_next)
			.service(get_corpora)
			.service(put_model)
			.service(get_loaded_model)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
