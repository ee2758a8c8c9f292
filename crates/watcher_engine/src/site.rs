use url::Url;

/// URL builder for one wiki site.
///
/// The base is resolved from the configured `(wiki, domain, language?)`
/// triplet: a `.` inside the wiki name carries its own language path
/// (`sub.lang` becomes `https://sub.domain/lang`), otherwise an optional
/// configured language appends a path segment.
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base: Url,
}

impl SiteUrls {
    pub fn resolve(wiki: &str, domain: &str, language: Option<&str>) -> Result<Self, url::ParseError> {
        let base = match wiki.split_once('.') {
            Some((sub, lang)) => format!("https://{sub}.{domain}/{lang}"),
            None => match language {
                Some(lang) => format!("https://{wiki}.{domain}/{lang}"),
                None => format!("https://{wiki}.{domain}"),
            },
        };
        Ok(Self {
            base: Url::parse(&base)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The MediaWiki API endpoint for this site.
    pub fn api_url(&self) -> Url {
        self.join(&["api.php"])
    }

    pub fn page_url(&self, title: &str) -> Url {
        self.join(&["wiki", &normalize_title(title)])
    }

    /// Permalink to one specific revision of a page.
    pub fn permalink(&self, title: &str, revision: u64) -> Url {
        let mut url = self.page_url(title);
        url.set_query(Some(&format!("oldid={revision}")));
        url
    }

    /// Diff between a submitted revision and the published one.
    pub fn diff_url(&self, title: &str, revision: u64, live_revision: u64) -> Url {
        let mut url = self.page_url(title);
        url.set_query(Some(&format!("diff={revision}&oldid={live_revision}")));
        url
    }

    pub fn talk_url(&self, title: &str) -> Url {
        self.join(&["wiki", &format!("Talk:{}", normalize_title(title))])
    }

    fn join(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        {
            // The base is always https://host[/lang], so segments are
            // appendable.
            let mut path = url.path_segments_mut().expect("https base url");
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }
}

fn normalize_title(title: &str) -> String {
    title.trim().replace(' ', "_")
}
