#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use rust_decimal_macros::dec;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };

    use crate::api::{
        PriceSource, YahooSource,
        yahoo::{parse_crumb, quote_summary_url},
    };

    const SUMMARY: &str = r#"{"quoteSummary":{"result":[{"summaryDetail":{"previousClose":{"raw":3264.5,"fmt":"3,264.50"}}}],"error":null}}"#;
    const UNAUTHORIZED: &str = r#"{"finance":{"result":null,"error":{"code":"Unauthorized","description":"Invalid Crumb"}}}"#;

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        String::from_utf8_lossy(&request).into_owned()
    }

    /// Minimal Yahoo stand-in: `/` sets the session cookie, getcrumb hands
    /// out `crumbs` in order (repeating the last), and quoteSummary answers
    /// only requests carrying the cookie and the `accepted` crumb.
    async fn fake_yahoo(
        crumbs: Vec<&'static str>,
        accepted: &'static str,
    ) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let paths = Arc::new(Mutex::new(Vec::new()));
        let served = Arc::clone(&paths);

        tokio::spawn(async move {
            let mut crumbs = crumbs.into_iter();
            let mut current = "";
            while let Ok((mut socket, _)) = listener.accept().await {
                let request = read_request(&mut socket).await;
                let path = request.split_whitespace().nth(1).unwrap_or("").to_string();
                let has_cookie = request.to_lowercase().contains("cookie: session=1");
                served.lock().unwrap().push(path.clone());

                let (status, headers, body) = if path == "/" {
                    ("404 Not Found", "Set-Cookie: session=1; Path=/\r\n", String::new())
                } else if path == "/v1/test/getcrumb" {
                    current = crumbs.next().unwrap_or(current);
                    ("200 OK", "", current.to_string())
                } else if path.starts_with("/v10/finance/quoteSummary/TCS.NS?") {
                    if has_cookie && path.ends_with(&format!("crumb={}", accepted)) {
                        ("200 OK", "", SUMMARY.to_string())
                    } else {
                        ("401 Unauthorized", "", UNAUTHORIZED.to_string())
                    }
                } else {
                    ("404 Not Found", "", String::new())
                };

                let response = format!(
                    "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    headers,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        (base, paths)
    }

    fn count(paths: &Arc<Mutex<Vec<String>>>, prefix: &str) -> usize {
        paths
            .lock()
            .unwrap()
            .iter()
            .filter(|path| path.starts_with(prefix))
            .count()
    }

    #[tokio::test]
    async fn detailed_quote_sends_cookie_and_cached_crumb() {
        let (base, paths) = fake_yahoo(vec!["abc"], "abc").await;
        let source = YahooSource::with_endpoints(Duration::from_secs(2), &base, &base).unwrap();

        let first = source.get_detailed_previous_close("TCS.NS").await.unwrap();
        let second = source.get_detailed_previous_close("TCS.NS").await.unwrap();

        assert_eq!(first, Some(dec!(3264.5)));
        assert_eq!(second, Some(dec!(3264.5)));
        assert_eq!(count(&paths, "/v1/test/getcrumb"), 1);
        assert_eq!(paths.lock().unwrap()[0], "/");
    }

    #[tokio::test]
    async fn rejected_crumb_is_refreshed_and_retried() {
        let (base, paths) = fake_yahoo(vec!["stale", "fresh"], "fresh").await;
        let source = YahooSource::with_endpoints(Duration::from_secs(2), &base, &base).unwrap();

        let close = source.get_detailed_previous_close("TCS.NS").await.unwrap();

        assert_eq!(close, Some(dec!(3264.5)));
        assert_eq!(count(&paths, "/v1/test/getcrumb"), 2);
        assert_eq!(count(&paths, "/v10/finance/quoteSummary/"), 2);
    }

    #[tokio::test]
    async fn persistent_rejection_is_an_error() {
        let (base, paths) = fake_yahoo(vec!["stale"], "never").await;
        let source = YahooSource::with_endpoints(Duration::from_secs(2), &base, &base).unwrap();

        let err = source.get_detailed_previous_close("TCS.NS").await.unwrap_err();

        assert!(format!("{:#}", err).contains("401"));
        assert_eq!(count(&paths, "/v10/finance/quoteSummary/"), 2);
    }

    #[test]
    fn quote_summary_url_carries_encoded_crumb() {
        assert_eq!(
            quote_summary_url("https://query1.finance.yahoo.com", "M%26M.NS", "a/b"),
            "https://query1.finance.yahoo.com/v10/finance/quoteSummary/M%26M.NS?modules=summaryDetail&crumb=a%2Fb"
        );
    }

    #[test]
    fn crumb_body_is_validated() {
        assert_eq!(parse_crumb("  Xy.z9AbC\n").unwrap(), "Xy.z9AbC");
        assert!(parse_crumb("").is_err());
        assert!(parse_crumb("<!DOCTYPE html><html></html>").is_err());
        assert!(parse_crumb("Too Many Requests").is_err());
        assert!(parse_crumb("has space").is_err());
    }
}
