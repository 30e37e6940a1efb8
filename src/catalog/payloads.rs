// attack patterns sent in security mode, grouped by category

pub const VALID_PAGES: &[&str] = &["", "index.html", "404.html", "nope.html"];

pub const PATH_TRAVERSAL_ATTEMPTS: &[&str] = &[
    "../../../etc/passwd",
    "../../../../etc/shadow",
    "../../.ssh/id_rsa",
    "%2e%2e%2f%2e%2e%2f%2e%2e%2fetc%2fpasswd",
    "..%2F..%2F..%2Fetc%2Fpasswd",
    "....//....//....//etc/passwd",
    "../../../Windows/win.ini",
    "..\\..\\..\\Windows\\win.ini",
    "../../../../../../../../../../etc/passwd",
    "/etc/passwd",
    "file:///etc/passwd",
];

pub const MALICIOUS_PATHS: &[&str] = &[
    "/admin",
    "/.git/config",
    "/.env",
    "/wp-admin",
    "/phpinfo.php",
    "/api/v1/users",
    "/.htaccess",
    "/backup.sql",
    "/wp-config.php",
    "/config.php",
    "/admin.php",
    "/.svn/entries",
    "/.DS_Store",
    "/robots.txt",
    "/composer.json",
    "/package.json",
];

pub const SPECIAL_CHARS: &[&str] = &[
    "/*", "/?", "/#", "/%00", "/%0A", "/%0D", "/%20", "/%25", "/;", "/\\", "/&&", "/||", "/;",
    "/|", "/<script>", "/'", "/\"", "/`", "/$(", "/${",
];
