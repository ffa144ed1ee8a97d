//! Outbound email through the Resend HTTP API.
//!
//! Every send is a single best-effort attempt: failures are logged and
//! reported as `false`, never raised, so a broken email provider cannot
//! abort registration or password-reset flows.

use serde_json::json;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

pub struct EmailService {
    api_key: String,
    from_email: String,
    base_url: String,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(api_key: &str, from_email: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            from_email: from_email.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Builds the verification link embedded in the email; the token rides
    /// as a query parameter.
    pub fn verification_url(&self, token: &str) -> String {
        format!("{}/api/auth/verify-email?token={}", self.base_url, token)
    }

    pub async fn send_verification_email(&self, to: &str, username: &str, token: &str) -> bool {
        let url = self.verification_url(token);
        let html = render_verification_email(username, &url);
        self.send(to, "Verifikasi Email - Flowly App", &html).await
    }

    pub async fn send_password_reset_otp(&self, to: &str, username: &str, otp: &str) -> bool {
        let html = render_reset_otp_email(username, otp);
        self.send(to, "Reset Password - Flowly App", &html).await
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> bool {
        let body = json!({
            "from": self.from_email,
            "to": [to],
            "subject": subject,
            "html": html,
        });

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                let status = resp.status();
                let detail = resp.text().await.unwrap_or_default();
                log::error!("Resend API error: {} {}", status, detail);
                false
            }
            Err(e) => {
                log::error!("Failed to send email via Resend: {}", e);
                false
            }
        }
    }
}

fn render_verification_email(username: &str, verification_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: #4CAF50; color: white; padding: 20px; text-align: center;">
      <h1>Selamat Datang di Flowly!</h1>
    </div>
    <div style="background: #f9f9f9; padding: 30px;">
      <h2>Halo {username}!</h2>
      <p>Terima kasih telah mendaftar di Flowly App. Untuk melengkapi proses registrasi,
      silakan verifikasi email Anda dengan mengklik tombol di bawah ini:</p>
      <div style="text-align: center;">
        <a href="{verification_url}" style="display: inline-block; background: #4CAF50; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px;">Verifikasi Email</a>
      </div>
      <p>Atau salin dan tempel tautan berikut ke browser Anda:</p>
      <p style="background: #eee; padding: 10px; word-break: break-all;">{verification_url}</p>
      <p><strong>Catatan:</strong> Tautan verifikasi ini akan kedaluwarsa dalam 24 jam.</p>
      <p>Jika Anda tidak mendaftar di Flowly App, silakan abaikan email ini.</p>
    </div>
  </div>
</body>
</html>"#
    )
}

fn render_reset_otp_email(username: &str, otp: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: #FF9800; color: white; padding: 20px; text-align: center;">
      <h1>Reset Password</h1>
    </div>
    <div style="background: #f9f9f9; padding: 30px;">
      <h2>Halo {username}!</h2>
      <p>Kami menerima permintaan untuk reset password akun Flowly Anda.
      Gunakan kode OTP berikut untuk melanjutkan proses reset password:</p>
      <div style="background: #fff; border: 2px dashed #FF9800; padding: 20px; text-align: center; margin: 20px 0;">
        <div style="font-size: 32px; font-weight: bold; color: #FF9800; letter-spacing: 5px;">{otp}</div>
      </div>
      <p><strong>Penting:</strong></p>
      <ul>
        <li>Kode OTP ini hanya berlaku selama <strong>1 jam</strong></li>
        <li>Jangan bagikan kode ini kepada siapa pun</li>
      </ul>
      <p>Jika Anda tidak meminta reset password, silakan abaikan email ini.</p>
    </div>
  </div>
</body>
</html>"#
    )
}
