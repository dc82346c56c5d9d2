//! Test Job Producer
//!
//! Generates synthetic boleto OCR texts and publishes them as analysis jobs
//! to NATS for worker testing.

use boleto_fraud_detector::extractor::{format_cnpj, format_linha_digitavel};
use boleto_fraud_detector::locale::format_brl;
use boleto_fraud_detector::types::BoletoJob;
use boleto_fraud_detector::validator::checksum::{cnpj_check_digits, modulo10, modulo11};
use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

const BANKS: &[(&str, &str)] = &[
    ("001", "Banco do Brasil"),
    ("104", "Caixa Econômica Federal"),
    ("237", "Bradesco"),
    ("341", "Itaú"),
    ("033", "Santander"),
];

/// FEBRABAN due date factor base
fn factor_base() -> NaiveDate {
    NaiveDate::from_ymd_opt(1997, 10, 7).unwrap_or_default()
}

/// Boleto text generator for testing
struct BoletoGenerator {
    rng: rand::rngs::ThreadRng,
}

/// Barcode and linha digitável of one synthetic boleto
struct BoletoCodes {
    barcode: String,
    linha: String,
}

impl BoletoGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    fn digits(&mut self, n: usize) -> String {
        (0..n)
            .map(|_| char::from(b'0' + self.rng.gen_range(0..10u8)))
            .collect()
    }

    /// Build a consistent barcode/linha pair
    fn codes(&mut self, bank: &str, valor_cents: u64, vencimento: NaiveDate) -> BoletoCodes {
        let fator = (vencimento - factor_base()).num_days().rem_euclid(9000) + 1000;
        let campo_livre = self.digits(25);

        let body = format!("{}9{:04}{:010}{}", bank, fator, valor_cents, campo_livre);
        let dv = modulo11(&body).unwrap_or_default();
        let barcode = format!("{}{}{}", &body[..4], dv, &body[4..]);

        let field1 = format!("{}9{}", bank, &campo_livre[..5]);
        let field2 = &campo_livre[5..15];
        let field3 = &campo_livre[15..25];
        let linha = format!(
            "{}{}{}{}{}{}{}{}",
            field1,
            modulo10(&field1).unwrap_or_default(),
            field2,
            modulo10(field2).unwrap_or_default(),
            field3,
            modulo10(field3).unwrap_or_default(),
            dv,
            &barcode[5..19],
        );

        BoletoCodes {
            barcode,
            linha: format_linha_digitavel(&linha),
        }
    }

    fn cnpj(&mut self) -> String {
        let base = format!("{}0001", self.digits(8));
        let (dv1, dv2) = cnpj_check_digits(&base).unwrap_or_default();
        format_cnpj(&format!("{}{}{}", base, dv1, dv2))
    }

    fn render(
        &mut self,
        bank: (&str, &str),
        codes: &BoletoCodes,
        valor_cents: u64,
        vencimento: NaiveDate,
        cnpj: &str,
    ) -> String {
        let agencia = self.rng.gen_range(100..9999);
        format!(
            "{name}\n{linha}\nBeneficiário: Empresa Exemplo LTDA\nCNPJ: {cnpj}\n\
             Agência/Código Beneficiário: {agencia}-{agencia_dv}\n\
             Vencimento: {vencimento}\nValor do Documento: {valor}\n{barcode}\n",
            name = bank.1,
            linha = codes.linha,
            cnpj = cnpj,
            agencia = agencia,
            agencia_dv = self.rng.gen_range(0..10),
            vencimento = vencimento.format("%d/%m/%Y"),
            valor = format_brl(valor_cents as f64 / 100.0),
            barcode = codes.barcode,
        )
    }

    /// Generate a boleto whose digits all check out
    fn generate_authentic(&mut self) -> BoletoJob {
        let bank = BANKS[self.rng.gen_range(0..BANKS.len())];
        let valor_cents = self.rng.gen_range(1_000..500_000);
        let vencimento = Local::now().date_naive() + ChronoDuration::days(self.rng.gen_range(1..60));
        let codes = self.codes(bank.0, valor_cents, vencimento);
        let cnpj = self.cnpj();

        BoletoJob {
            analise_id: uuid::Uuid::new_v4().to_string(),
            texto_ocr: self.render(bank, &codes, valor_cents, vencimento, &cnpj),
        }
    }

    /// Generate a boleto with one tampered element
    fn generate_tampered(&mut self) -> BoletoJob {
        let bank = BANKS[self.rng.gen_range(0..BANKS.len())];
        let valor_cents = self.rng.gen_range(1_000..5_000_000);
        let mut vencimento =
            Local::now().date_naive() + ChronoDuration::days(self.rng.gen_range(1..60));
        let mut codes = self.codes(bank.0, valor_cents, vencimento);
        let mut cnpj = self.cnpj();

        match self.rng.gen_range(0..4) {
            // Altered block check digit
            0 => codes.linha = flip_digit(&codes.linha, 10),
            // Altered barcode check digit
            1 => codes.barcode = flip_digit(&codes.barcode, 4),
            // Altered CNPJ check digit
            2 => {
                let last = cnpj.len() - 1;
                cnpj = flip_digit(&cnpj, last);
            }
            // Due date far in the past
            _ => vencimento -= ChronoDuration::days(365 * 7),
        }

        BoletoJob {
            analise_id: uuid::Uuid::new_v4().to_string(),
            texto_ocr: self.render(bank, &codes, valor_cents, vencimento, &cnpj),
        }
    }
}

fn flip_digit(text: &str, index: usize) -> String {
    text.char_indices()
        .map(|(i, c)| match (i == index, c.to_digit(10)) {
            (true, Some(d)) => char::from(b'0' + ((d + 1) % 10) as u8),
            _ => c,
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Job Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("boletos.jobs");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            Some(c)
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            None
        }
    };

    let mut generator = BoletoGenerator::new();
    let mut rng = rand::thread_rng();
    let mut authentic_count = 0;
    let mut tampered_count = 0;

    for i in 0..count {
        let job = if rng.gen_bool(fraud_rate.clamp(0.0, 1.0)) {
            tampered_count += 1;
            generator.generate_tampered()
        } else {
            authentic_count += 1;
            generator.generate_authentic()
        };

        match &client {
            Some(client) => {
                let payload = serde_json::to_vec(&job)?;
                client.publish(subject.to_string(), payload.into()).await?;
            }
            None if i == 0 || (i + 1) % 10 == 0 => {
                info!("Sample job {}:\n{}", i + 1, serde_json::to_string_pretty(&job)?);
            }
            None => {}
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Produced {}/{} jobs ({} authentic, {} tampered)",
                i + 1,
                count,
                authentic_count,
                tampered_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Produced {} jobs ({} authentic, {} tampered)",
        count, authentic_count, tampered_count
    );

    Ok(())
}
