// crates.io
use rand::{Rng, distr::Alphanumeric, seq::SliceRandom};
use sha2::Sha256;
// self
use wechat_broker::{
	error::SignatureConfigError,
	sign::{self, SignParams, SignType},
};

const KEY: &str = "KEY";

fn random_pairs(n: usize) -> Vec<(String, String)> {
	let mut rng = rand::rng();

	(0..n)
		.map(|i| {
			let value: String = (&mut rng).sample_iter(Alphanumeric).take(8).map(char::from).collect();

			(format!("k{i:02}"), value)
		})
		.collect()
}

#[test]
fn signature_ignores_insertion_order() {
	for _ in 0..32 {
		let mut pairs = random_pairs(12);
		let ordered = sign::sign(&SignParams::from_iter(pairs.clone()), KEY).expect("Params should sign.");

		pairs.shuffle(&mut rand::rng());

		let shuffled = sign::sign(&SignParams::from_iter(pairs), KEY).expect("Params should sign.");

		assert_eq!(ordered, shuffled);
	}
}

#[test]
fn empty_values_never_contribute() {
	let pairs = random_pairs(6);
	let base = SignParams::from_iter(pairs.clone());
	let padded = SignParams::from_iter(pairs).with("zz_empty", "").with("aa_empty", "");

	assert_eq!(sign::sign(&base, KEY), sign::sign(&padded, KEY));
	assert_eq!(
		sign::sign_as(SignType::HmacSha256, &base, KEY),
		sign::sign_as(SignType::HmacSha256, &padded, KEY)
	);
}

#[test]
fn documented_example_drops_empty_key() {
	let with_empty = SignParams::from_iter([("b", "2"), ("a", "1"), ("c", "")]);
	let without = SignParams::from_iter([("a", "1"), ("b", "2")]);

	assert_eq!(sign::canonical_string(&with_empty, KEY), "a=1&b=2&key=KEY");
	assert_eq!(
		sign::sign(&with_empty, KEY).expect("Params should sign."),
		"96EFED773639208FEE49D1158B653E01"
	);
	assert_eq!(sign::sign(&with_empty, KEY), sign::sign(&without, KEY));
}

#[test]
fn output_is_upper_hex_of_digest_width() {
	let params = SignParams::from_iter(random_pairs(4));
	let md5 = sign::sign(&params, KEY).expect("MD5 should sign.");
	let sha256 = sign::sign_with::<Sha256>(&params, KEY).expect("SHA-256 should sign.");

	assert_eq!(md5.len(), 32);
	assert_eq!(sha256.len(), 64);
	assert!(md5.chars().chain(sha256.chars()).all(|c| matches!(c, '0'..='9' | 'A'..='F')));
}

#[test]
fn key_changes_the_signature() {
	let params = SignParams::from_iter(random_pairs(4));

	assert_ne!(sign::sign(&params, "KEY-A"), sign::sign(&params, "KEY-B"));
}

#[test]
fn configuration_errors_fail_fast() {
	assert_eq!(
		sign::sign(&SignParams::from_iter([("a", "1")]), ""),
		Err(SignatureConfigError::MissingSecretKey)
	);
	assert_eq!(
		sign::sign_as(SignType::HmacSha256, &SignParams::new(), KEY),
		Err(SignatureConfigError::EmptyParameters)
	);
}

#[test]
fn jsapi_signature_is_lower_hex_sha1() {
	let signature = sign::jsapi_signature("ticket", "nonce", 1, "https://example.com/");

	assert_eq!(signature.len(), 40);
	assert!(signature.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
}
