//! Literal end-to-end scenarios for the watermarking and document
//! verification pipelines.

use chrono::Utc;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use serde_json::json;

use provenance_core::config::{DocumentVerifierConfig, OcrConfig, WatermarkConfig};
use provenance_core::document::{DocumentVerifyMethod, verify_document};
use provenance_core::fingerprint::{dhash_image, simhash64};
use provenance_core::ids::mint_watermark_id;
use provenance_core::ocr::{DocumentRasterizer, OcrError};
use provenance_core::repository::{InMemoryRepository, Repository};
use provenance_core::signer::{SignatureVerdict, Signer, SignerError};
use provenance_core::types::{Fingerprint64, ProvenanceRecord, Sha256Hash, WatermarkId};
use provenance_core::watermark::{embed, extract};

fn solid_gray_png(width: u32, height: u32, value: u8) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(width, height, Rgb([value, value, value]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn textured_png(width: u32, height: u32, salt: u8) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            ((x + salt as u32) % 256) as u8,
            ((y + salt as u32) % 256) as u8,
            ((x + y + salt as u32) % 256) as u8,
        ])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn jpeg_recompress(png_bytes: &[u8], quality: u8) -> Vec<u8> {
    let dynamic = image::load_from_memory(png_bytes).unwrap();
    let rgb = dynamic.to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(&rgb).unwrap();
    buf
}

#[test]
fn embed_extract_roundtrip_on_solid_gray_image_hits_code_and_confidence() {
    let id = WatermarkId::from_hex("00112233445566778899aabbccddeeff").unwrap();
    let cfg = WatermarkConfig { secret: "supersecret".to_string(), ..WatermarkConfig::default() };
    let base = solid_gray_png(512, 512, 128);

    let watermarked = embed(&base, &id, &cfg).expect("embed should succeed on a 512x512 image");
    let outcome = extract(&watermarked, &cfg, true);

    assert!(outcome.ok, "extraction should recover the embedded id: {:?}", outcome.reason);
    assert_eq!(outcome.watermark_id_hex, Some(id.to_hex()));
    assert!(outcome.confidence >= 0.95, "confidence too low: {}", outcome.confidence);
    assert_eq!(id.code().0, "WMK-00112233445566");
}

#[test]
fn embed_survives_jpeg_recompression() {
    let id = mint_watermark_id();
    let cfg = WatermarkConfig::default();
    let base = textured_png(512, 512, 7);

    let watermarked = embed(&base, &id, &cfg).expect("embed should succeed");
    let jpeg_bytes = jpeg_recompress(&watermarked, 85);

    let outcome = extract(&jpeg_bytes, &cfg, false);
    assert!(outcome.ok, "extraction should survive JPEG recompression at q85: {:?}", outcome.reason);
    assert_eq!(outcome.watermark_id_hex, Some(id.to_hex()));
}

#[test]
fn embed_survives_a_small_edge_crop() {
    let id = mint_watermark_id();
    let cfg = WatermarkConfig::default();
    let base = textured_png(512, 512, 3);

    let watermarked = embed(&base, &id, &cfg).expect("embed should succeed");
    let dynamic = image::load_from_memory(&watermarked).unwrap();
    let cropped = dynamic.crop_imm(16, 16, dynamic.width() - 16, dynamic.height() - 16);

    let mut cropped_bytes = Vec::new();
    cropped
        .write_to(&mut std::io::Cursor::new(&mut cropped_bytes), ImageFormat::Png)
        .unwrap();

    let outcome = extract(&cropped_bytes, &cfg, false);
    assert!(outcome.ok, "extraction should survive a 16px edge crop: {:?}", outcome.reason);
    assert_eq!(outcome.watermark_id_hex, Some(id.to_hex()));
}

#[test]
fn two_watermarked_images_never_cross_extract() {
    let cfg = WatermarkConfig::default();
    let id_a = mint_watermark_id();
    let id_b = mint_watermark_id();

    let base_a = textured_png(512, 512, 11);
    let base_b = textured_png(512, 512, 29);

    let watermarked_a = embed(&base_a, &id_a, &cfg).unwrap();
    let watermarked_b = embed(&base_b, &id_b, &cfg).unwrap();

    let outcome_a = extract(&watermarked_a, &cfg, true);
    let outcome_b = extract(&watermarked_b, &cfg, true);
    assert_eq!(outcome_a.watermark_id_hex, Some(id_a.to_hex()));
    assert_eq!(outcome_b.watermark_id_hex, Some(id_b.to_hex()));

    let cfg_wrong_secret = WatermarkConfig { secret: "a-different-secret".to_string(), ..WatermarkConfig::default() };
    let cross = extract(&watermarked_a, &cfg_wrong_secret, false);
    assert!(!cross.ok || cross.watermark_id_hex != Some(id_a.to_hex()));
}

#[test]
fn simhash_rejects_short_text_and_is_deterministic_on_longer_text() {
    assert_eq!(simhash64(""), None);
    assert_eq!(simhash64("too few tokens here"), None);

    let text = "the quick brown fox jumps over the lazy dog again and again";
    let first = simhash64(text).expect("text with >=10 tokens should hash");
    let second = simhash64(text).expect("hashing is deterministic");
    assert_eq!(first, second);
    assert_eq!(first.to_hex().len(), 16);
}

struct StubSigner;
impl Signer for StubSigner {
    fn verify(&self, _bytes: &[u8]) -> Result<SignatureVerdict, SignerError> {
        Ok(SignatureVerdict::default())
    }
}

struct StubRasterizer {
    text: String,
    pages: Vec<DynamicImage>,
}
impl DocumentRasterizer for StubRasterizer {
    fn extract_text(&self, _bytes: &[u8], _max_pages: usize) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
    fn render_pages_rgb(&self, _bytes: &[u8], _dpi: u32, _max_pages: usize) -> Result<Vec<DynamicImage>, OcrError> {
        Ok(self.pages.clone())
    }
}

fn tied_record(byte: u8, per_page: Vec<Fingerprint64>, text_sim: Option<Fingerprint64>) -> ProvenanceRecord {
    let id = mint_watermark_id();
    ProvenanceRecord {
        id,
        user_id: "user-1".to_string(),
        original_filename: "contract.pdf".to_string(),
        stored_filename: format!("{}.pdf", id.code().0),
        mime_type: "application/pdf".to_string(),
        original_file_hash: Sha256Hash::compute(&[byte]),
        watermark_id: id,
        watermark_code: id.code(),
        perceptual_hash: None,
        pdf_text_simhash: text_sim,
        metadata: json!({"title": "Master Services Agreement"}),
        metadata_hash: Sha256Hash::compute(b"{}"),
        per_page_hashes: per_page,
        signed_at: None,
        signer_cert_thumbprint: None,
        issued_at: Utc::now(),
        source_created_at: None,
        algo_version: 2,
    }
}

#[test]
fn identical_per_page_hashes_across_two_records_yield_ambiguous_match() {
    let page_one = DynamicImage::new_rgb8(32, 32);
    let page_two = DynamicImage::new_rgb8(32, 40);
    let hash_one = dhash_image(&page_one);
    let hash_two = dhash_image(&page_two);

    let text = "master services agreement between the parties effective as of closing";
    let text_sim = simhash64(text).unwrap();

    let repo = InMemoryRepository::new();
    repo.insert_record(tied_record(1, vec![hash_one, hash_two], Some(text_sim))).unwrap();
    repo.insert_record(tied_record(2, vec![hash_one, hash_two], Some(text_sim))).unwrap();

    let signer = StubSigner;
    let rasterizer = StubRasterizer { text: text.to_string(), pages: vec![page_one, page_two] };
    let cfg = DocumentVerifierConfig::default();
    let ocr_cfg = OcrConfig::default();

    let outcome = verify_document(b"query pdf bytes", &cfg, &ocr_cfg, &repo, &signer, &rasterizer);

    assert!(!outcome.valid);
    assert_eq!(outcome.method, Some(DocumentVerifyMethod::PerceptualPdfAmbiguous));
    assert_eq!(outcome.candidates.len(), 2);
}
