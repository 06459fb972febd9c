//! JSAPI payments: unified orders, bridge parameters, and asynchronous notifications.
//!
//! Gateway replies are read in two tiers. A failed `return_code` means the call
//! itself was rejected and surfaces as [`Error::PayGateway`]; a failed
//! `result_code` means the business operation failed and surfaces as
//! [`Error::RemoteApi`] carrying the business `err_code`.

// self
use crate::{
	_prelude::*,
	error::{DecodeError, EncodeError},
	flows::{Wechat, common},
	http::{CONTENT_TYPE_XML, HttpRequest},
	obs::{self, Operation},
	sign::{self, OrderSignFields, SignParams, SignType},
	wire::{self, PayReply},
};

/// Trade type used for in-page payments.
pub const TRADE_TYPE_JSAPI: &str = "JSAPI";

/// Caller-supplied order fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayParams {
	/// Amount in cents, as a decimal string.
	pub total_fee: String,
	/// Payer IP (`spbill_create_ip`).
	#[serde(skip)]
	pub create_ip: String,
	/// Order description.
	pub body: String,
	/// Merchant order number.
	pub out_trade_no: String,
	/// Payer open id; required for JSAPI trades.
	#[serde(skip)]
	pub open_id: String,
}

#[derive(Serialize)]
struct UnifiedOrderRequest<'a> {
	appid: &'a str,
	mch_id: &'a str,
	nonce_str: &'a str,
	sign: &'a str,
	body: &'a str,
	out_trade_no: &'a str,
	total_fee: &'a str,
	spbill_create_ip: &'a str,
	notify_url: &'a str,
	trade_type: &'a str,
	#[serde(skip_serializing_if = "str::is_empty")]
	openid: &'a str,
}

/// Successful unified order reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UnifiedOrderResponse {
	/// `appid` echoed by the gateway.
	#[serde(rename = "appid")]
	pub app_id: String,
	/// `mch_id` echoed by the gateway.
	pub mch_id: String,
	/// Gateway nonce.
	pub nonce_str: String,
	/// Gateway signature.
	pub sign: String,
	/// Trade type.
	pub trade_type: String,
	/// Prepayment id consumed by the JS bridge.
	pub prepay_id: String,
	/// QR code URL (native trades only).
	pub code_url: String,
}

/// Parameters for `getBrandWCPayRequest`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsapiPayParams {
	/// App id.
	pub app_id: String,
	/// Unix timestamp (seconds).
	pub timestamp: i64,
	/// Nonce echoed from the unified order.
	pub nonce_str: String,
	/// Prepayment id.
	pub prepay_id: String,
	/// Digest used for [`JsapiPayParams::sign`].
	pub sign_type: SignType,
	/// Upper-case hex signature.
	pub sign: String,
}
impl JsapiPayParams {
	/// `package` value expected by the bridge.
	pub fn package(&self) -> String {
		format!("prepay_id={}", self.prepay_id)
	}
}

/// Asynchronous payment notification posted by the gateway.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PayNotify {
	/// App id.
	#[serde(rename = "appid")]
	pub app_id: String,
	/// Merchant id.
	pub mch_id: String,
	/// Device info.
	pub device_info: String,
	/// Gateway nonce.
	pub nonce_str: String,
	/// Carried signature.
	pub sign: String,
	/// Sign type label; empty means MD5.
	pub sign_type: String,
	/// Payer open id.
	#[serde(rename = "openid")]
	pub open_id: String,
	/// `Y` when the payer follows the account.
	pub is_subscribe: String,
	/// Trade type.
	pub trade_type: String,
	/// Paying bank.
	pub bank_type: String,
	/// Order amount in cents.
	pub total_fee: i64,
	/// Settled amount in cents, when coupons applied.
	pub settlement_total_fee: Option<i64>,
	/// Currency.
	pub fee_type: String,
	/// Cash amount in cents.
	pub cash_fee: i64,
	/// Cash currency.
	pub cash_fee_type: String,
	/// Coupon amount in cents.
	pub coupon_fee: Option<i64>,
	/// Number of coupons used.
	pub coupon_count: Option<i64>,
	/// Platform transaction id.
	pub transaction_id: String,
	/// Merchant order number.
	pub out_trade_no: String,
	/// Merchant attachment.
	pub attach: String,
	/// Completion time (`yyyyMMddHHmmss`).
	pub time_end: String,
}

#[derive(Serialize)]
struct NotifyAck<'a> {
	return_code: &'a str,
	return_msg: &'a str,
}

/// Payment helpers bound to one app.
#[derive(Clone, Debug)]
pub struct Pay {
	wechat: Wechat,
}
impl Pay {
	pub(crate) fn new(wechat: Wechat) -> Self {
		Self { wechat }
	}

	/// Places a JSAPI unified order and returns the gateway reply.
	pub async fn unified_order(&self, params: &PayParams) -> Result<UnifiedOrderResponse> {
		obs::observe(Operation::UnifiedOrder, "unified_order", self.place_order(params)).await
	}

	/// Places a unified order and signs the bridge parameters for it.
	pub async fn jsapi_params(&self, params: &PayParams) -> Result<JsapiPayParams> {
		obs::observe(Operation::UnifiedOrder, "jsapi_params", async {
			let order = self.place_order(params).await?;

			self.sign_jsapi(order, common::unix_timestamp())
		})
		.await
	}

	/// Decodes and authenticates a payment notification body.
	pub fn parse_notify(&self, body: &[u8]) -> Result<PayNotify> {
		let _span = obs::OperationSpan::new(Operation::PayNotify, "parse_notify").entered();

		obs::record_operation(Operation::PayNotify, obs::Outcome::Attempt);

		let result = self.verify_notify(body);

		obs::record_operation(Operation::PayNotify, obs::Outcome::of(&result));

		result
	}

	/// Renders the XML acknowledgement the gateway expects for a notification.
	pub fn notify_ack(success: bool, message: &str) -> Result<String, EncodeError> {
		let return_code = if success { "SUCCESS" } else { "FAIL" };

		wire::encode_xml(&NotifyAck { return_code, return_msg: message })
	}

	async fn place_order(&self, params: &PayParams) -> Result<UnifiedOrderResponse> {
		let config = self.wechat.config();
		let settings = config.pay_settings()?;
		let nonce_str = common::nonce_str(common::PAY_NONCE_LEN);
		let fields = OrderSignFields {
			app_id: config.app_id(),
			body: &params.body,
			mch_id: &settings.mch_id,
			nonce_str: &nonce_str,
			notify_url: &settings.notify_url,
			open_id: &params.open_id,
			out_trade_no: &params.out_trade_no,
			spbill_create_ip: &params.create_ip,
			total_fee: &params.total_fee,
			trade_type: TRADE_TYPE_JSAPI,
		};
		let sign = sign::unified_order_sign(&fields, settings.key.expose())?;
		let payload = wire::encode_xml(&UnifiedOrderRequest {
			appid: fields.app_id,
			mch_id: fields.mch_id,
			nonce_str: fields.nonce_str,
			sign: &sign,
			body: fields.body,
			out_trade_no: fields.out_trade_no,
			total_fee: fields.total_fee,
			spbill_create_ip: fields.spbill_create_ip,
			notify_url: fields.notify_url,
			trade_type: fields.trade_type,
			openid: fields.open_id,
		})?;
		let url = config.endpoints.mch_url("pay/unifiedorder")?;
		let response = self
			.wechat
			.transport()
			.execute(HttpRequest::post(url, CONTENT_TYPE_XML, payload))
			.await?;

		wire::decode_pay_reply(&response.body)?.into_result()
	}

	fn sign_jsapi(&self, order: UnifiedOrderResponse, timestamp: i64) -> Result<JsapiPayParams> {
		if order.prepay_id.is_empty() {
			return Err(DecodeError::MissingField { field: "prepay_id" }.into());
		}

		let config = self.wechat.config();
		let settings = config.pay_settings()?;
		let app_id =
			if order.app_id.is_empty() { config.app_id().to_string() } else { order.app_id };
		let nonce_str = if order.nonce_str.is_empty() {
			common::nonce_str(common::PAY_NONCE_LEN)
		} else {
			order.nonce_str
		};
		let sign_type = SignType::Md5;
		let params = SignParams::new()
			.with("appId", app_id.as_str())
			.with("timeStamp", timestamp.to_string())
			.with("nonceStr", nonce_str.as_str())
			.with("package", format!("prepay_id={}", order.prepay_id))
			.with("signType", sign_type.as_str());
		let sign = sign::sign_as(sign_type, &params, settings.key.expose())?;

		Ok(JsapiPayParams { app_id, timestamp, nonce_str, prepay_id: order.prepay_id, sign_type, sign })
	}

	fn verify_notify(&self, body: &[u8]) -> Result<PayNotify> {
		let settings = self.wechat.config().pay_settings()?;
		let reply = wire::decode_pay_reply::<PayNotify>(body)?;

		if matches!(reply, PayReply::GatewayFailure { .. }) {
			return reply.into_result();
		}

		let fields: BTreeMap<String, String> = wire::decode_xml(body)?;
		let params = SignParams::from(fields);
		let sign_type = params.get("sign_type").unwrap_or_default().parse::<SignType>()?;

		sign::verify(&params, settings.key.expose(), sign_type)?;

		reply.into_result()
	}
}
