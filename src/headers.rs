//! Builtin headers embedded in the toolchain.
//!
//! When an angle-bracket include is not found on disk (include paths, then
//! the resource directory next to the toolchain executable), these embedded
//! copies stand in for the resource directory, so the toolchain works with
//! no header tree installed. Declarations are limited to the C subset the
//! parser accepts.

use rustc_hash::FxHashMap;

pub fn builtin_headers() -> FxHashMap<&'static str, &'static str> {
    let mut headers = FxHashMap::default();
    headers.insert("stdio.h", STDIO_H);
    headers.insert("stdlib.h", STDLIB_H);
    headers.insert("string.h", STRING_H);
    headers.insert("stdbool.h", STDBOOL_H);
    headers.insert("stddef.h", STDDEF_H);
    headers
}

const STDIO_H: &str = "\
#ifndef _CTREE_STDIO_H
#define _CTREE_STDIO_H 1

int printf(const char *format, ...);
int scanf(const char *format, ...);
int puts(const char *s);
int putchar(int c);
int getchar(void);

#endif
";

const STDLIB_H: &str = "\
#ifndef _CTREE_STDLIB_H
#define _CTREE_STDLIB_H 1

void *malloc(int size);
void *calloc(int count, int size);
void *realloc(void *ptr, int size);
void free(void *ptr);
void exit(int status);
int abs(int n);
int atoi(const char *s);

#endif
";

const STRING_H: &str = "\
#ifndef _CTREE_STRING_H
#define _CTREE_STRING_H 1

int strlen(const char *s);
int strcmp(const char *a, const char *b);
char *strcpy(char *dst, const char *src);
char *strncpy(char *dst, const char *src, int n);
void *memset(void *dst, int value, int n);
void *memcpy(void *dst, const void *src, int n);

#endif
";

const STDBOOL_H: &str = "\
#ifndef _CTREE_STDBOOL_H
#define _CTREE_STDBOOL_H 1

#define bool int
#define true 1
#define false 0

#endif
";

const STDDEF_H: &str = "\
#ifndef _CTREE_STDDEF_H
#define _CTREE_STDDEF_H 1

#define size_t int
#define ptrdiff_t int

#endif
";
