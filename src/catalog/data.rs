//! The static challenge dataset
//!
//! 12 entries per tier, 36 total. Reference solutions are JavaScript, the
//! community's lingua franca; the reviewer prompt presents them as the
//! intended behavior, not as the only acceptable language.

use super::{Challenge, Difficulty};

type Row = (&'static str, &'static str, &'static str, &'static str, &'static [&'static str]);

const BEGINNER: &[Row] = &[
    (
        "b1",
        "Reverse a String",
        "Write a function that takes a string and returns it reversed.",
        "function reverse(s) { return [...s].reverse().join(''); }",
        &["strings"],
    ),
    (
        "b2",
        "FizzBuzz",
        "Print the numbers 1 to 100, but print Fizz for multiples of 3, Buzz for multiples of 5, and FizzBuzz for multiples of both.",
        "for (let i = 1; i <= 100; i++) { let s = ''; if (i % 3 === 0) s += 'Fizz'; if (i % 5 === 0) s += 'Buzz'; console.log(s || i); }",
        &["loops", "conditionals"],
    ),
    (
        "b3",
        "Palindrome Check",
        "Return true if the given string reads the same forwards and backwards, ignoring case.",
        "function isPalindrome(s) { const t = s.toLowerCase(); return t === [...t].reverse().join(''); }",
        &["strings"],
    ),
    (
        "b4",
        "Sum of Digits",
        "Given a non-negative integer, return the sum of its decimal digits.",
        "function digitSum(n) { return [...String(n)].reduce((a, d) => a + Number(d), 0); }",
        &["math"],
    ),
    (
        "b5",
        "Find the Maximum",
        "Return the largest number in a non-empty array without using the built-in max helper.",
        "function max(xs) { let m = xs[0]; for (const x of xs) if (x > m) m = x; return m; }",
        &["arrays"],
    ),
    (
        "b6",
        "Vowel Counter",
        "Count the vowels (a, e, i, o, u) in a string, case-insensitively.",
        "function countVowels(s) { return [...s.toLowerCase()].filter(c => 'aeiou'.includes(c)).length; }",
        &["strings"],
    ),
    (
        "b7",
        "Factorial",
        "Compute n! for a non-negative integer n. 0! is 1.",
        "function factorial(n) { return n <= 1 ? 1 : n * factorial(n - 1); }",
        &["math", "recursion"],
    ),
    (
        "b8",
        "Even or Odd",
        "Return 'even' or 'odd' for a given integer, handling negatives correctly.",
        "function parity(n) { return n % 2 === 0 ? 'even' : 'odd'; }",
        &["math"],
    ),
    (
        "b9",
        "Celsius to Fahrenheit",
        "Convert a temperature in Celsius to Fahrenheit, rounded to one decimal place.",
        "function toFahrenheit(c) { return Math.round((c * 9 / 5 + 32) * 10) / 10; }",
        &["math"],
    ),
    (
        "b10",
        "Count Words",
        "Count the words in a sentence. Words are separated by one or more spaces.",
        "function countWords(s) { return s.split(/\\s+/).filter(Boolean).length; }",
        &["strings"],
    ),
    (
        "b11",
        "Remove Duplicates",
        "Return a new array with duplicate values removed, preserving first-seen order.",
        "function dedupe(xs) { return [...new Set(xs)]; }",
        &["arrays"],
    ),
    (
        "b12",
        "Leap Year",
        "Return true if the given year is a leap year in the Gregorian calendar.",
        "function isLeap(y) { return (y % 4 === 0 && y % 100 !== 0) || y % 400 === 0; }",
        &["math", "conditionals"],
    ),
];

const INTERMEDIATE: &[Row] = &[
    (
        "i1",
        "Two Sum",
        "Given an array of integers and a target, return the indices of the two numbers that add up to the target.",
        "function twoSum(xs, t) { const seen = new Map(); for (let i = 0; i < xs.length; i++) { if (seen.has(t - xs[i])) return [seen.get(t - xs[i]), i]; seen.set(xs[i], i); } }",
        &["arrays", "hash-maps"],
    ),
    (
        "i2",
        "Anagram Detector",
        "Return true if two strings are anagrams of each other, ignoring case and spaces.",
        "function isAnagram(a, b) { const norm = s => [...s.toLowerCase().replace(/ /g, '')].sort().join(''); return norm(a) === norm(b); }",
        &["strings", "sorting"],
    ),
    (
        "i3",
        "Binary Search",
        "Implement binary search over a sorted array. Return the index of the target or -1.",
        "function bsearch(xs, t) { let lo = 0, hi = xs.length - 1; while (lo <= hi) { const mid = (lo + hi) >> 1; if (xs[mid] === t) return mid; if (xs[mid] < t) lo = mid + 1; else hi = mid - 1; } return -1; }",
        &["search", "arrays"],
    ),
    (
        "i4",
        "Roman Numerals",
        "Convert an integer between 1 and 3999 to its Roman numeral representation.",
        "function toRoman(n) { const table = [[1000,'M'],[900,'CM'],[500,'D'],[400,'CD'],[100,'C'],[90,'XC'],[50,'L'],[40,'XL'],[10,'X'],[9,'IX'],[5,'V'],[4,'IV'],[1,'I']]; let out = ''; for (const [v, s] of table) while (n >= v) { out += s; n -= v; } return out; }",
        &["math", "strings"],
    ),
    (
        "i5",
        "Caesar Cipher",
        "Shift every letter in a string by n positions, wrapping around the alphabet and preserving case.",
        "function caesar(s, n) { return s.replace(/[a-z]/gi, c => { const base = c <= 'Z' ? 65 : 97; return String.fromCharCode((c.charCodeAt(0) - base + n) % 26 + base); }); }",
        &["strings", "ciphers"],
    ),
    (
        "i6",
        "Flatten an Array",
        "Flatten an arbitrarily nested array of values into a single flat array, without the built-in flat helper.",
        "function flatten(xs) { return xs.reduce((a, x) => a.concat(Array.isArray(x) ? flatten(x) : x), []); }",
        &["arrays", "recursion"],
    ),
    (
        "i7",
        "Balanced Brackets",
        "Return true if every (, [, and { in the string is closed in the right order.",
        "function balanced(s) { const pairs = {')': '(', ']': '[', '}': '{'}; const st = []; for (const c of s) { if ('([{'.includes(c)) st.push(c); else if (c in pairs && st.pop() !== pairs[c]) return false; } return st.length === 0; }",
        &["stacks", "strings"],
    ),
    (
        "i8",
        "Longest Common Prefix",
        "Find the longest prefix shared by every string in an array.",
        "function lcp(xs) { if (!xs.length) return ''; let p = xs[0]; for (const s of xs) { while (!s.startsWith(p)) p = p.slice(0, -1); } return p; }",
        &["strings"],
    ),
    (
        "i9",
        "Matrix Transpose",
        "Transpose a rectangular 2D array, turning rows into columns.",
        "function transpose(m) { return m[0].map((_, j) => m.map(row => row[j])); }",
        &["arrays", "matrices"],
    ),
    (
        "i10",
        "Run-Length Encoding",
        "Compress a string by replacing runs of repeated characters with the character followed by the run length.",
        "function rle(s) { return s.replace(/(.)\\1*/g, run => run[0] + run.length); }",
        &["strings", "compression"],
    ),
    (
        "i11",
        "Prime Sieve",
        "Return all prime numbers up to n using the Sieve of Eratosthenes.",
        "function primes(n) { const sieve = new Array(n + 1).fill(true); sieve[0] = sieve[1] = false; for (let i = 2; i * i <= n; i++) if (sieve[i]) for (let j = i * i; j <= n; j += i) sieve[j] = false; return sieve.flatMap((p, i) => p ? [i] : []); }",
        &["math", "algorithms"],
    ),
    (
        "i12",
        "Merge Intervals",
        "Given a list of [start, end] intervals, merge all overlapping intervals.",
        "function merge(ivs) { ivs.sort((a, b) => a[0] - b[0]); const out = []; for (const [s, e] of ivs) { const last = out[out.length - 1]; if (last && s <= last[1]) last[1] = Math.max(last[1], e); else out.push([s, e]); } return out; }",
        &["arrays", "sorting"],
    ),
];

const ADVANCED: &[Row] = &[
    (
        "a1",
        "LRU Cache",
        "Implement a fixed-capacity cache with get and put in O(1), evicting the least recently used entry when full.",
        "class LRU { constructor(cap) { this.cap = cap; this.map = new Map(); } get(k) { if (!this.map.has(k)) return -1; const v = this.map.get(k); this.map.delete(k); this.map.set(k, v); return v; } put(k, v) { this.map.delete(k); this.map.set(k, v); if (this.map.size > this.cap) this.map.delete(this.map.keys().next().value); } }",
        &["data-structures", "caching"],
    ),
    (
        "a2",
        "Word Ladder",
        "Given a start word, an end word, and a dictionary, find the length of the shortest transformation sequence changing one letter at a time.",
        "function ladder(begin, end, words) { const dict = new Set(words); let q = [[begin, 1]]; const seen = new Set([begin]); while (q.length) { const [w, d] = q.shift(); if (w === end) return d; for (let i = 0; i < w.length; i++) for (let c = 97; c < 123; c++) { const n = w.slice(0, i) + String.fromCharCode(c) + w.slice(i + 1); if (dict.has(n) && !seen.has(n)) { seen.add(n); q.push([n, d + 1]); } } } return 0; }",
        &["graphs", "bfs"],
    ),
    (
        "a3",
        "Dijkstra's Shortest Path",
        "Compute the shortest distance between two nodes in a weighted graph with non-negative edges.",
        "function dijkstra(adj, src, dst) { const dist = new Map([[src, 0]]); const pq = [[0, src]]; while (pq.length) { pq.sort((a, b) => a[0] - b[0]); const [d, u] = pq.shift(); if (u === dst) return d; if (d > (dist.get(u) ?? Infinity)) continue; for (const [v, w] of adj[u] || []) { const nd = d + w; if (nd < (dist.get(v) ?? Infinity)) { dist.set(v, nd); pq.push([nd, v]); } } } return -1; }",
        &["graphs", "shortest-path"],
    ),
    (
        "a4",
        "Regex Matcher",
        "Implement regular expression matching supporting '.' and '*' over the full input string.",
        "function isMatch(s, p) { if (!p) return !s; const first = !!s && (p[0] === s[0] || p[0] === '.'); if (p[1] === '*') return isMatch(s, p.slice(2)) || (first && isMatch(s.slice(1), p)); return first && isMatch(s.slice(1), p.slice(1)); }",
        &["recursion", "dynamic-programming"],
    ),
    (
        "a5",
        "N-Queens",
        "Count the distinct ways to place n queens on an n by n board so none attack each other.",
        "function nQueens(n) { let count = 0; const cols = new Set(), d1 = new Set(), d2 = new Set(); (function place(r) { if (r === n) { count++; return; } for (let c = 0; c < n; c++) { if (cols.has(c) || d1.has(r - c) || d2.has(r + c)) continue; cols.add(c); d1.add(r - c); d2.add(r + c); place(r + 1); cols.delete(c); d1.delete(r - c); d2.delete(r + c); } })(0); return count; }",
        &["backtracking"],
    ),
    (
        "a6",
        "Serialize a Binary Tree",
        "Write serialize and deserialize functions that round-trip a binary tree through a string.",
        "function serialize(node) { return node ? `${node.val},${serialize(node.left)}${serialize(node.right)}` : '#,'; } function deserialize(s) { const vals = s.split(','); let i = 0; return (function build() { const v = vals[i++]; if (v === '#') return null; return { val: Number(v), left: build(), right: build() }; })(); }",
        &["trees", "recursion"],
    ),
    (
        "a7",
        "Median of Two Sorted Arrays",
        "Find the median of two sorted arrays in logarithmic time.",
        "function median(a, b) { if (a.length > b.length) return median(b, a); const m = a.length, n = b.length; let lo = 0, hi = m; while (lo <= hi) { const i = (lo + hi) >> 1, j = ((m + n + 1) >> 1) - i; const aL = i ? a[i - 1] : -Infinity, aR = i < m ? a[i] : Infinity; const bL = j ? b[j - 1] : -Infinity, bR = j < n ? b[j] : Infinity; if (aL <= bR && bL <= aR) { if ((m + n) % 2) return Math.max(aL, bL); return (Math.max(aL, bL) + Math.min(aR, bR)) / 2; } if (aL > bR) hi = i - 1; else lo = i + 1; } }",
        &["arrays", "binary-search"],
    ),
    (
        "a8",
        "Trie Autocomplete",
        "Build a trie supporting insert and a prefix query returning every stored word with that prefix.",
        "class Trie { constructor() { this.root = {}; } insert(w) { let n = this.root; for (const c of w) n = n[c] ??= {}; n.end = true; } complete(p) { let n = this.root; for (const c of p) { n = n[c]; if (!n) return []; } const out = []; (function walk(node, acc) { if (node.end) out.push(p + acc); for (const k of Object.keys(node)) if (k.length === 1) walk(node[k], acc + k); })(n, ''); return out; } }",
        &["tries", "strings"],
    ),
    (
        "a9",
        "Topological Sort",
        "Order the nodes of a directed acyclic graph so every edge points forward, or report a cycle.",
        "function topoSort(adj, n) { const indeg = new Array(n).fill(0); for (let u = 0; u < n; u++) for (const v of adj[u] || []) indeg[v]++; const q = []; for (let u = 0; u < n; u++) if (!indeg[u]) q.push(u); const out = []; while (q.length) { const u = q.shift(); out.push(u); for (const v of adj[u] || []) if (--indeg[v] === 0) q.push(v); } return out.length === n ? out : null; }",
        &["graphs", "sorting"],
    ),
    (
        "a10",
        "Edit Distance",
        "Compute the minimum number of single-character insertions, deletions, and substitutions to turn one string into another.",
        "function editDistance(a, b) { const dp = Array.from({ length: a.length + 1 }, (_, i) => [i, ...new Array(b.length).fill(0)]); for (let j = 0; j <= b.length; j++) dp[0][j] = j; for (let i = 1; i <= a.length; i++) for (let j = 1; j <= b.length; j++) dp[i][j] = Math.min(dp[i-1][j] + 1, dp[i][j-1] + 1, dp[i-1][j-1] + (a[i-1] === b[j-1] ? 0 : 1)); return dp[a.length][b.length]; }",
        &["dynamic-programming", "strings"],
    ),
    (
        "a11",
        "Sudoku Validator",
        "Check whether a 9x9 Sudoku board (with empty cells allowed) violates any row, column, or box constraint.",
        "function validSudoku(board) { const seen = new Set(); for (let r = 0; r < 9; r++) for (let c = 0; c < 9; c++) { const v = board[r][c]; if (v === '.') continue; const keys = [`r${r}${v}`, `c${c}${v}`, `b${(r / 3 | 0)}${(c / 3 | 0)}${v}`]; for (const k of keys) { if (seen.has(k)) return false; seen.add(k); } } return true; }",
        &["validation", "hash-sets"],
    ),
    (
        "a12",
        "Knapsack",
        "Given item weights and values and a capacity, find the maximum total value that fits.",
        "function knapsack(weights, values, cap) { const dp = new Array(cap + 1).fill(0); for (let i = 0; i < weights.length; i++) for (let w = cap; w >= weights[i]; w--) dp[w] = Math.max(dp[w], dp[w - weights[i]] + values[i]); return dp[cap]; }",
        &["dynamic-programming"],
    ),
];

fn build(rows: &[Row], difficulty: Difficulty) -> impl Iterator<Item = Challenge> + '_ {
    rows.iter().map(move |(id, title, description, solution, tags)| Challenge {
        id: id.to_string(),
        title: title.to_string(),
        difficulty,
        description: description.to_string(),
        reference_solution: solution.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    })
}

/// Materialize all 36 challenges in tier order
pub fn all_challenges() -> Vec<Challenge> {
    build(BEGINNER, Difficulty::Beginner)
        .chain(build(INTERMEDIATE, Difficulty::Intermediate))
        .chain(build(ADVANCED, Difficulty::Advanced))
        .collect()
}
