//! Server-rendered dashboard.

use crate::snapshot::{ExerciseFlag, VitalsSnapshot};

/// Thermometer band for a temperature in °C.
pub fn temperature_class(temp: f64) -> &'static str {
    if temp < 36.0 {
        "temp-low"
    } else if temp <= 37.5 {
        "temp-normal"
    } else if temp <= 41.0 {
        "temp-fever"
    } else {
        "temp-danger"
    }
}

/// Colour of the SpO2 drop.
pub fn spo2_colour(spo2: f64) -> &'static str {
    if spo2 < 90.0 {
        "#e74c3c"
    } else if spo2 < 95.0 {
        "#f39c12"
    } else {
        "#ff4757"
    }
}

/// Seconds per heartbeat for the pulse animation; 60 bpm when unknown.
pub fn beat_period_secs(heart_rate: f64) -> f64 {
    let bpm = if heart_rate > 0.0 { heart_rate } else { 60.0 };
    60.0 / bpm
}

pub fn render_dashboard(s: &VitalsSnapshot) -> String {
    let exercise = match s.exercise {
        ExerciseFlag::Yes => "si",
        ExerciseFlag::No => "no",
    };
    let (banner_class, banner) = if s.alert {
        ("alerta activa", "ALERTA: valores fuera de rango")
    } else {
        ("alerta", "Valores normales")
    };

    format!(
        "<!DOCTYPE html>\
         <html><head><meta charset='utf-8'>\
         <meta http-equiv='refresh' content='30'>\
         <title>Monitor de signos vitales</title>\
         <link rel='stylesheet' href='/static/style.css'>\
         <style>\
         @keyframes latido {{ 0%,100% {{ transform: scale(1); }} 30% {{ transform: scale(1.2); }} }}\
         .activa {{ color: #c0392b; font-weight: bold; }}\
         </style>\
         </head><body>\
         <h1>Monitor de signos vitales</h1>\
         <p class='{banner_class}'>{banner}</p>\
         <div class='tarjeta'>\
         <span id='corazon' style='display:inline-block;animation: latido {period:.2}s infinite'>&#10084;</span>\
         <span class='etiqueta'>{hr:.1} bpm</span></div>\
         <div class='tarjeta'>\
         <span class='gota-sangre' style='color:{drop}'>&#9679;</span>\
         <span class='valor-spo2'>{spo2:.1}%</span></div>\
         <div class='tarjeta termometro {temp_class}' data-temp='{temp:.1}'>\
         <span>{temp:.1} &deg;C</span></div>\
         <div class='tarjeta'><span>Humedad: {hum:.1}%</span></div>\
         <div class='tarjeta'><span>Edad: {age}</span> <span>Ejercicio: {exercise}</span></div>\
         <p><a href='/api/data'>/api/data</a> | <a href='/health'>/health</a></p>\
         </body></html>",
        period = beat_period_secs(s.heart_rate),
        hr = s.heart_rate,
        drop = spo2_colour(s.spo2),
        spo2 = s.spo2,
        temp_class = temperature_class(s.temperature),
        temp = s.temperature,
        hum = s.humidity,
        age = s.age,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Demographics;
    use approx::assert_relative_eq;

    #[test]
    fn temperature_bands() {
        assert_eq!(temperature_class(35.9), "temp-low");
        assert_eq!(temperature_class(37.5), "temp-normal");
        assert_eq!(temperature_class(39.0), "temp-fever");
        assert_eq!(temperature_class(41.5), "temp-danger");
    }

    #[test]
    fn spo2_colours() {
        assert_eq!(spo2_colour(85.0), "#e74c3c");
        assert_eq!(spo2_colour(92.0), "#f39c12");
        assert_eq!(spo2_colour(98.0), "#ff4757");
    }

    #[test]
    fn unknown_rate_animates_at_one_hz() {
        assert_relative_eq!(beat_period_secs(0.0), 1.0);
        assert_relative_eq!(beat_period_secs(120.0), 0.5);
    }

    #[test]
    fn fail_safe_page_shows_alert() {
        let html = render_dashboard(&VitalsSnapshot::fail_safe(&Demographics::default()));
        assert!(html.contains("ALERTA"));
        assert!(html.contains("0.0 bpm"));
        assert!(html.contains("Edad: 25"));
        assert!(html.contains("Ejercicio: no"));
    }
}
