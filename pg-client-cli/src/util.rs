use qrcode::render::Pixel;
use qrcode::Color;

/// Renders the session pointer as a QR code on stderr, for the IRMA app to scan.
pub(crate) fn print_qr(qr: &irma::Qr) {
    let code = match serde_json::to_string(qr)
        .map_err(|e| e.to_string())
        .and_then(|s| qrcode::QrCode::new(s).map_err(|e| e.to_string()))
    {
        Ok(code) => code,
        Err(e) => {
            log::error!("could not render session QR code: {e}");
            return;
        }
    };

    let scode = code
        .render::<char>()
        .quiet_zone(true)
        .module_dimensions(2, 1)
        .light_color(Pixel::default_color(Color::Dark))
        .dark_color(Pixel::default_color(Color::Light))
        .build();

    eprintln!("Please scan the following QR-code with IRMA/Yivi:");
    eprintln!("\n\n{}", scode);
}

/// Strips the `.enc` extension, the name the decrypted file is written to.
pub(crate) fn decrypted_name(input: &str) -> Option<&str> {
    input.strip_suffix(".enc").filter(|s| !s.is_empty())
}
