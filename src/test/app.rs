#[cfg(test)]
mod tests {
    use std::{io::Write, sync::Arc};

    use clap::Parser;
    use rust_decimal_macros::dec;
    use tempfile::{Builder, NamedTempFile};

    use crate::{
        app::App,
        config::{Cli, Config},
        error::{ConfigError, LoadError},
        models::Signal,
        test::fakes::{FakeSource, RecordingIndicator},
    };

    fn portfolio_file(contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn config(path: &str, extra: &[&str]) -> Config {
        let mut args = vec![
            "portfolio-mood-light",
            "--portfolio",
            path,
            "--market-suffix",
            ".NS",
            "--device-id",
            "dev1",
            "--device-ip",
            "127.0.0.1",
            "--local-key",
            "0123456789abcdef",
            "--no-clear",
        ];
        args.extend_from_slice(extra);
        Config::from_cli(Cli::parse_from(args)).unwrap()
    }

    const PORTFOLIO: &str = r#"[
        {"symbol": "infy", "qty": 10, "buy_price": 1400},
        {"symbol": "tcs", "qty": 2, "buy_price": 3000},
        {"symbol": "bad", "qty": 1, "buy_price": 10}
    ]"#;

    fn source() -> Arc<FakeSource> {
        Arc::new(
            FakeSource::default()
                .with_quote("INFY.NS", Some(dec!(1500)), Some(dec!(1480)))
                .with_quote("TCS.NS", Some(dec!(3000)), Some(dec!(3000)))
                .failing("BAD.NS"),
        )
    }

    #[tokio::test]
    async fn cycle_computes_and_lights_the_bulb() {
        let file = portfolio_file(PORTFOLIO);
        let indicator = RecordingIndicator::default();
        let app = App::load(
            config(file.path().to_str().unwrap(), &["--once"]),
            source(),
            Box::new(indicator.clone()),
        )
        .unwrap();

        let mut out = Vec::new();
        let outcome = app.run_cycle(&mut out).await.unwrap();

        assert_eq!(app.holdings().len(), 3);
        assert_eq!(outcome.rows.len(), 3);
        assert!(!outcome.rows[2].is_priced());
        // (15000 * 1.35 + 6000 * 0) / 21000
        assert_eq!(*outcome.summary.overall_one_day_change_pct(), Some(dec!(0.96)));
        assert_eq!(outcome.signal, Signal::Gain);
        assert_eq!(indicator.commands(), vec!["power_on", "set_color(0,255,0)"]);
        let report = String::from_utf8(out).unwrap();
        assert!(report.lines().any(|line| line.starts_with("tcs ")));
        assert!(!report.contains("TCS.NS"));
    }

    #[tokio::test]
    async fn unknown_signal_leaves_bulb_alone_until_shutdown() {
        let file = portfolio_file(PORTFOLIO);
        let indicator = RecordingIndicator::default();
        let source = Arc::new(FakeSource::default().failing("INFY.NS"));
        let app = App::load(
            config(file.path().to_str().unwrap(), &["--once"]),
            source,
            Box::new(indicator.clone()),
        )
        .unwrap();

        app.run(std::future::pending()).await;

        assert_eq!(indicator.commands(), vec!["power_off"]);
    }

    #[tokio::test]
    async fn neutral_day_sets_white() {
        let file = portfolio_file(r#"[{"symbol": "tcs", "qty": 2, "buy_price": 3000}]"#);
        let indicator = RecordingIndicator::default();
        let app = App::load(
            config(file.path().to_str().unwrap(), &["--once"]),
            source(),
            Box::new(indicator.clone()),
        )
        .unwrap();

        let outcome = app.run_cycle(&mut Vec::new()).await.unwrap();

        assert_eq!(outcome.signal, Signal::Neutral);
        assert_eq!(indicator.commands(), vec!["power_on", "set_neutral"]);
    }

    #[tokio::test]
    async fn indicator_failure_does_not_stop_the_cycle() {
        let file = portfolio_file(PORTFOLIO);
        let indicator = RecordingIndicator::failing();
        let app = App::load(
            config(file.path().to_str().unwrap(), &["--once"]),
            source(),
            Box::new(indicator.clone()),
        )
        .unwrap();

        let outcome = app.run_cycle(&mut Vec::new()).await.unwrap();
        assert_eq!(outcome.signal, Signal::Gain);

        app.run(std::future::pending()).await;
        assert_eq!(indicator.commands().last().unwrap(), "power_off");
    }

    #[tokio::test]
    async fn interrupt_stops_the_loop_and_powers_off() {
        let file = portfolio_file(PORTFOLIO);
        let indicator = RecordingIndicator::default();
        let app = App::load(
            config(file.path().to_str().unwrap(), &["--interval", "3600"]),
            source(),
            Box::new(indicator.clone()),
        )
        .unwrap();

        app.run(async {}).await;

        assert_eq!(
            indicator.commands(),
            vec!["power_on", "set_color(0,255,0)", "power_off"]
        );
    }

    #[test]
    fn load_rejects_bad_portfolio() {
        let file = portfolio_file(r#"[{"symbol": "infy", "qty": 1}]"#);
        let result = App::load(
            config(file.path().to_str().unwrap(), &[]),
            source(),
            Box::new(RecordingIndicator::default()),
        );

        assert!(matches!(result, Err(LoadError::Format(_))));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let cli = Cli::parse_from([
            "portfolio-mood-light",
            "--device-id",
            "dev1",
            "--device-ip",
            "",
            "--local-key",
            "0123456789abcdef",
        ]);
        let err = Config::from_cli(cli).unwrap_err();
        assert!(err.to_string().contains("TUYA_DEVICE_IP"));
    }

    #[test]
    fn unsupported_protocol_version_is_rejected() {
        let cli = Cli::parse_from([
            "portfolio-mood-light",
            "--device-id",
            "dev1",
            "--device-ip",
            "10.0.0.2",
            "--local-key",
            "0123456789abcdef",
            "--protocol-version",
            "3.4",
        ]);
        let err = Config::from_cli(cli).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProtocol(_)));
    }
}
