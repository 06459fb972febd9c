//! Template messages.

// self
use crate::{
	_prelude::*,
	flows::{Wechat, common},
	obs::{self, Operation},
};

/// One `{{name.DATA}}` slot of a template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateData {
	/// Rendered value.
	pub value: String,
	/// Optional `#RRGGBB` color.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
}
impl TemplateData {
	/// Creates an uncolored value.
	pub fn new(value: impl Into<String>) -> Self {
		Self { value: value.into(), color: None }
	}
}

/// Mini program jump target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniProgram {
	/// Mini program app id.
	#[serde(rename = "appid")]
	pub app_id: String,
	/// Page path, query string allowed.
	#[serde(rename = "pagepath")]
	pub page_path: String,
}

/// Template message to send.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMessage {
	/// Recipient open id.
	#[serde(rename = "touser")]
	pub to_user: String,
	/// Template id.
	pub template_id: String,
	/// Page opened on tap.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	/// Message color.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	/// Slot values by name.
	pub data: BTreeMap<String, TemplateData>,
	/// Mini program opened on tap.
	#[serde(default, rename = "miniprogram", skip_serializing_if = "Option::is_none")]
	pub mini_program: Option<MiniProgram>,
}
impl TemplateMessage {
	/// Starts a message for `to_user` using `template_id`.
	pub fn new(to_user: impl Into<String>, template_id: impl Into<String>) -> Self {
		Self { to_user: to_user.into(), template_id: template_id.into(), ..Default::default() }
	}

	/// Sets a slot value.
	pub fn with_data(mut self, name: impl Into<String>, data: TemplateData) -> Self {
		self.data.insert(name.into(), data);

		self
	}
}

/// Private template registered on the account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateInfo {
	/// Template id.
	pub template_id: String,
	/// Title.
	pub title: String,
	/// Primary industry.
	pub primary_industry: String,
	/// Secondary industry.
	pub deputy_industry: String,
	/// Template body with `{{name.DATA}}` slots.
	pub content: String,
	/// Rendered example.
	pub example: String,
}

#[derive(Deserialize)]
struct SendReply {
	#[serde(rename = "msgid")]
	msg_id: i64,
}

#[derive(Deserialize)]
struct ListReply {
	#[serde(default)]
	template_list: Vec<TemplateInfo>,
}

/// Template message helpers bound to one app.
#[derive(Clone, Debug)]
pub struct Templates {
	wechat: Wechat,
}
impl Templates {
	pub(crate) fn new(wechat: Wechat) -> Self {
		Self { wechat }
	}

	/// Sends `message` and returns the platform message id.
	pub async fn send(&self, message: &TemplateMessage) -> Result<i64> {
		obs::observe(Operation::Template, "send", async {
			let url = self.url("cgi-bin/message/template/send").await?;
			let reply: SendReply = common::post_api(self.wechat.transport(), url, message).await?;

			Ok(reply.msg_id)
		})
		.await
	}

	/// Lists the account's private templates.
	pub async fn list(&self) -> Result<Vec<TemplateInfo>> {
		obs::observe(Operation::Template, "list", async {
			let url = self.url("cgi-bin/template/get_all_private_template").await?;
			let reply: ListReply = common::get_api(self.wechat.transport(), url).await?;

			Ok(reply.template_list)
		})
		.await
	}

	async fn url(&self, path: &str) -> Result<Url> {
		let access_token = self.wechat.access_token().await?;
		let url = self.wechat.config().endpoints.api_url(path)?;

		Ok(common::with_access_token(url, &access_token))
	}
}
